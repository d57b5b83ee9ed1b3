//! The runtime context connection tasks run on.

use std::io;
use std::time::Duration;

use tokio::runtime::{Builder, Handle, Runtime};
use tracing::info;

/// Default number of runtime worker threads.
pub const DEFAULT_WORKER_THREADS: usize = 2;

/// How long [`NetworkService::shutdown`] waits for tasks to wind down.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

/// Owns a small multi-thread runtime.
///
/// Create one per process (or per test) and hand it to every
/// [`Connection`](super::connection::Connection).  Must be created and
/// dropped outside of any async context.
#[derive(Debug)]
pub struct NetworkService {
    runtime: Runtime,
}

impl NetworkService {
    /// Starts the runtime with `worker_threads` workers (at least one).
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the runtime threads cannot be spawned.
    pub fn start(worker_threads: usize) -> io::Result<Self> {
        let workers = worker_threads.max(1);
        let runtime = Builder::new_multi_thread()
            .worker_threads(workers)
            .thread_name("flyt-net")
            .enable_all()
            .build()?;
        info!(workers, "network service started");
        Ok(Self { runtime })
    }

    pub fn handle(&self) -> Handle {
        self.runtime.handle().clone()
    }

    /// Stops the runtime.  Tasks still running are cancelled.
    pub fn shutdown(self) {
        self.runtime.shutdown_timeout(SHUTDOWN_GRACE);
        info!("network service stopped");
    }
}
