//! TCP accept loop.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use flyt_core::protocol::stream::DEFAULT_MAX_LINE_LEN;
use flyt_core::{LineStream, StopToken};
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use super::ServerError;
use crate::application::dispatch::CommandDispatcher;
use crate::application::session::serve_connection;

/// Pause after a failed `accept` (e.g. out of file descriptors).
pub const ACCEPT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// A bound listener plus the dispatcher its sessions share.
pub struct CommandServer {
    listener: TcpListener,
    dispatcher: Arc<CommandDispatcher>,
    max_line_len: usize,
}

impl CommandServer {
    /// Binds `addr`.  Port 0 picks a free port; see [`CommandServer::local_addr`].
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Bind`] if the address cannot be bound.
    pub async fn bind(addr: SocketAddr, dispatcher: Arc<CommandDispatcher>) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind { addr, source })?;
        Ok(Self {
            listener,
            dispatcher,
            max_line_len: DEFAULT_MAX_LINE_LEN,
        })
    }

    /// Sets the longest request line a session accepts.
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// # Errors
    ///
    /// Returns the I/O error if the socket's address cannot be read.
    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        Ok(self.listener.local_addr()?)
    }

    /// Accepts connections until `stop` fires, then waits for every session
    /// to finish.
    ///
    /// Sessions end on their own when their peer closes; on stop they see
    /// the same signal at their next socket wait.
    pub async fn run(self, stop: StopToken) -> Result<(), ServerError> {
        info!(addr = %self.local_addr()?, "listening");
        let mut sessions = JoinSet::new();

        loop {
            let accepted = tokio::select! {
                biased;
                _ = stop.stopped() => break,
                accepted = self.listener.accept() => accepted,
            };
            while sessions.try_join_next().is_some() {}

            let (socket, peer) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    warn!("accept failed: {e}");
                    if wait_before_retry(&stop).await {
                        continue;
                    }
                    break;
                }
            };
            if let Err(e) = socket.set_nodelay(true) {
                warn!(%peer, "could not set TCP_NODELAY: {e}");
            }

            let id = Uuid::new_v4();
            let lines = LineStream::new(socket, stop.clone()).with_max_line_len(self.max_line_len);
            let dispatcher = Arc::clone(&self.dispatcher);
            sessions.spawn(
                async move {
                    info!(%peer, "connection accepted");
                    match serve_connection(lines, &dispatcher).await {
                        Ok(()) => info!("connection closed"),
                        Err(e) => warn!("connection dropped: {e}"),
                    }
                }
                .instrument(info_span!("session", %id)),
            );
        }

        info!(open = sessions.len(), "listener stopped");
        while sessions.join_next().await.is_some() {}
        Ok(())
    }
}

/// Sleeps for [`ACCEPT_RETRY_DELAY`]; `false` if `stop` fired first.
async fn wait_before_retry(stop: &StopToken) -> bool {
    tokio::select! {
        biased;
        _ = stop.stopped() => false,
        _ = tokio::time::sleep(ACCEPT_RETRY_DELAY) => true,
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
