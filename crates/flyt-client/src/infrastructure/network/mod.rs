//! Network infrastructure for the client application.
//!
//! Architecture:
//! - [`service::NetworkService`] owns the tokio runtime every connection
//!   task runs on.  It is created explicitly and passed to each connection.
//! - [`connection::Connection`] owns one TCP socket at a time.  `connect`
//!   and `disconnect` are synchronous; everything after `connect` happens in
//!   a single task that drains the command queue.
//! - [`queue::CommandQueue`] is the cross-thread hand-off between callers and
//!   that task.

pub mod connection;
pub mod queue;
pub mod service;

use std::net::SocketAddr;

use thiserror::Error;

/// Errors returned synchronously by [`connection::Connection`].
///
/// Per-command failures never show up here: they travel back on the
/// command's completion receiver.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// The operation needs an active session and there is none.
    #[error("not connected")]
    NotConnected,

    /// `connect` was called while a session is still active.
    #[error("already connected")]
    AlreadyConnected,

    /// The TCP connection could not be opened.
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Preparing the freshly opened socket failed.
    #[error("connection I/O error: {0}")]
    Io(#[from] std::io::Error),
}
