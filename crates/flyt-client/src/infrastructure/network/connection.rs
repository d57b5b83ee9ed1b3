//! The client connection engine.
//!
//! # Lifecycle
//!
//! ```text
//!           connect(addr)            disconnect()
//!  Idle ──────────────────▶ Active ──────────────────▶ Idle
//!                             │
//!                             │ peer closed / I/O error
//!                             ▼
//!                          Finished ── connect(addr) reaps it ──▶ Active
//! ```
//!
//! `connect` opens the socket on the calling thread, so it either returns an
//! error with nothing started or returns `Ok` with the session task running.
//! The socket is then moved into that task, which is the only code that ever
//! touches it.  The engine keeps a cloned handle of the socket solely to shut
//! it down from `disconnect`.
//!
//! The state lock guards bookkeeping only and is never held while waiting
//! for the session task, so the task (and the image callbacks it runs) may
//! call back into the connection at any time.  `disconnect` marks the
//! session as closing, releases the lock, and then waits for the task.  A
//! `connect` racing it gets `AlreadyConnected` until the old task is gone;
//! a second `disconnect` waits for the first to finish.

use std::net::{Shutdown, SocketAddr, TcpStream as StdTcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Condvar, Mutex, MutexGuard, PoisonError};

use flyt_core::protocol::stream::DEFAULT_MAX_LINE_LEN;
use flyt_core::{Command, LineStream, StopSource, StopToken, StreamError};
use tokio::net::TcpStream;
use tokio::runtime::Handle;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

use super::queue::CommandQueue;
use super::service::NetworkService;
use super::ConnectionError;
use crate::application::session::{round_trip, CommandOutcome, Request};

/// Per-connection tunables.
#[derive(Debug, Clone)]
pub struct ConnectionConfig {
    /// Upper bound for one incoming response line.
    pub max_line_len: usize,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }
}

/// One running session: everything needed to end it and to learn that it ended.
struct Session {
    peer: SocketAddr,
    /// Clone of the task's socket, used only for `shutdown`.
    control: StdTcpStream,
    stop: StopSource,
    finished: Arc<AtomicBool>,
    exited: mpsc::Receiver<()>,
}

impl Session {
    fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Shuts the socket down, stops the task, and blocks until it exited.
    fn close(self) {
        let _ = self.control.shutdown(Shutdown::Both);
        self.stop.stop();
        // Err means the task was dropped with its runtime: it is gone either way.
        let _ = self.exited.recv();
        debug!(peer = %self.peer, "session task joined");
    }
}

enum State {
    Idle,
    Active(Session),
    /// `disconnect` is waiting for the session task to exit.
    Closing,
}

/// A client connection to one server at a time.
///
/// All methods are synchronous and may be called from any thread, image
/// callbacks included.  The exception is `disconnect` (and dropping the
/// connection): it blocks until the session task has exited, so it must not
/// run on that task.
pub struct Connection {
    handle: Handle,
    config: ConnectionConfig,
    queue: Arc<CommandQueue>,
    state: Mutex<State>,
    /// Signalled when a `Closing` state is left.
    closed: Condvar,
}

impl Connection {
    pub fn new(service: &NetworkService, config: ConnectionConfig) -> Self {
        Self {
            handle: service.handle(),
            config,
            queue: Arc::new(CommandQueue::new()),
            state: Mutex::new(State::Idle),
            closed: Condvar::new(),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The running session, if there is one and it has not ended on its own.
    fn live_session(state: &State) -> Option<&Session> {
        match state {
            State::Active(session) if !session.is_finished() => Some(session),
            _ => None,
        }
    }

    /// Opens a TCP connection to `addr` and starts the session task.
    ///
    /// A session that already ended on its own is reaped first.  Starting a
    /// session clears whatever the previous one left in the queue.
    ///
    /// # Errors
    ///
    /// - [`ConnectionError::AlreadyConnected`] while a session is active or
    ///   still being closed; that session is left untouched.
    /// - [`ConnectionError::Connect`] if the socket cannot be opened.
    /// - [`ConnectionError::Io`] if the socket cannot be prepared.
    pub fn connect(&self, addr: SocketAddr) -> Result<(), ConnectionError> {
        let mut state = self.lock_state();
        if Self::live_session(&state).is_some() || matches!(*state, State::Closing) {
            return Err(ConnectionError::AlreadyConnected);
        }
        // The task of a finished session has already left its loop.
        if let State::Active(dead) = std::mem::replace(&mut *state, State::Idle) {
            dead.close();
        }

        let socket =
            StdTcpStream::connect(addr).map_err(|source| ConnectionError::Connect { addr, source })?;
        socket.set_nodelay(true)?;
        socket.set_nonblocking(true)?;
        let control = socket.try_clone()?;
        let stream = {
            let _runtime = self.handle.enter();
            TcpStream::from_std(socket)?
        };

        self.queue.clear();
        let (stop, token) = StopSource::new();
        let lines = LineStream::new(stream, stop.token()).with_max_line_len(self.config.max_line_len);
        let finished = Arc::new(AtomicBool::new(false));
        let (exit_tx, exited) = mpsc::channel();

        self.handle.spawn(session_task(
            lines,
            Arc::clone(&self.queue),
            token,
            Arc::clone(&finished),
            exit_tx,
            addr,
        ));
        info!(peer = %addr, "connected");

        *state = State::Active(Session {
            peer: addr,
            control,
            stop,
            finished,
            exited,
        });
        Ok(())
    }

    /// Ends the current session and waits for its task to exit.
    ///
    /// Returns immediately when there is no session.  After it returns no
    /// further I/O happens on the old socket.  Commands that were still
    /// queued stay visible in [`Connection::pending_commands`] until the next
    /// `connect`.
    pub fn disconnect(&self) {
        let session = {
            let mut state = self.lock_state();
            while matches!(*state, State::Closing) {
                state = self
                    .closed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner);
            }
            match std::mem::replace(&mut *state, State::Closing) {
                State::Active(session) => session,
                other => {
                    *state = other;
                    return;
                }
            }
        };

        let peer = session.peer;
        session.close();
        *self.lock_state() = State::Idle;
        self.closed.notify_all();
        info!(%peer, "disconnected");
    }

    /// `true` while a session is running.
    pub fn is_connected(&self) -> bool {
        Self::live_session(&self.lock_state()).is_some()
    }

    /// Address of the current session's server, even if it ended on its own.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        match &*self.lock_state() {
            State::Active(session) => Some(session.peer),
            State::Idle | State::Closing => None,
        }
    }

    /// Queues `request` behind everything submitted before it.
    ///
    /// The returned receiver resolves after the command's round trip.
    ///
    /// # Errors
    ///
    /// [`ConnectionError::NotConnected`] when no session is running.
    pub fn send_command(
        &self,
        request: impl Into<Request>,
    ) -> Result<oneshot::Receiver<CommandOutcome>, ConnectionError> {
        let state = self.lock_state();
        match Self::live_session(&state) {
            Some(_) => Ok(self.queue.push(request.into())),
            None => Err(ConnectionError::NotConnected),
        }
    }

    /// Commands submitted but not yet answered, oldest first.
    pub fn pending_commands(&self) -> Vec<Command> {
        self.queue.snapshot()
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        self.disconnect();
    }
}

/// Body of the session task.
async fn session_task(
    lines: LineStream<TcpStream>,
    queue: Arc<CommandQueue>,
    stop: StopToken,
    finished: Arc<AtomicBool>,
    exit_tx: mpsc::Sender<()>,
    peer: SocketAddr,
) {
    match drive(lines, &queue, &stop).await {
        Ok(()) | Err(StreamError::Closed) => info!(%peer, "session closed"),
        Err(e) => warn!(%peer, pending = queue.len(), "session ended: {e}"),
    }
    // `lines` has been dropped by now, so the socket is closed.
    finished.store(true, Ordering::Release);
    let _ = exit_tx.send(());
}

/// Drains the queue in order until stopped or the stream fails.
async fn drive(
    mut lines: LineStream<TcpStream>,
    queue: &CommandQueue,
    stop: &StopToken,
) -> Result<(), StreamError> {
    loop {
        while let Some(request) = queue.front() {
            if stop.is_stopped() {
                return Ok(());
            }
            let outcome = round_trip(&mut lines, &request).await?;
            queue.complete_front(outcome);
        }

        tokio::select! {
            biased;
            _ = stop.stopped() => return Ok(()),
            _ = queue.wait() => {}
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;

    #[test]
    fn test_new_connection_is_idle() {
        let service = NetworkService::start(1).unwrap();
        let connection = Connection::new(&service, ConnectionConfig::default());

        assert!(!connection.is_connected());
        assert_eq!(connection.peer_addr(), None);
        assert!(connection.pending_commands().is_empty());
    }

    #[test]
    fn test_send_command_while_idle_is_not_connected() {
        let service = NetworkService::start(1).unwrap();
        let connection = Connection::new(&service, ConnectionConfig::default());

        let result = connection.send_command(Command::Arm);

        assert!(matches!(result, Err(ConnectionError::NotConnected)));
        assert!(connection.pending_commands().is_empty());
    }

    #[test]
    fn test_connect_refused_reports_address() {
        // Arrange: grab a free port, then close it.
        let addr = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap()
        };
        let service = NetworkService::start(1).unwrap();
        let connection = Connection::new(&service, ConnectionConfig::default());

        // Act
        let result = connection.connect(addr);

        // Assert
        match result {
            Err(ConnectionError::Connect { addr: reported, .. }) => assert_eq!(reported, addr),
            other => panic!("expected Connect error, got {other:?}"),
        }
        assert!(!connection.is_connected());
    }

    #[test]
    fn test_disconnect_without_session_is_a_no_op() {
        let service = NetworkService::start(1).unwrap();
        let connection = Connection::new(&service, ConnectionConfig::default());

        connection.disconnect();
        connection.disconnect();

        assert!(!connection.is_connected());
    }

    #[test]
    fn test_connect_twice_is_already_connected() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let service = NetworkService::start(1).unwrap();
        let connection = Connection::new(&service, ConnectionConfig::default());

        connection.connect(addr).unwrap();
        let second = connection.connect(addr);

        assert!(matches!(second, Err(ConnectionError::AlreadyConnected)));
        assert!(connection.is_connected());
        connection.disconnect();
        assert!(!connection.is_connected());
    }
}
