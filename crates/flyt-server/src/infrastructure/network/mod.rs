//! Network infrastructure for the server application.
//!
//! [`server::CommandServer`] binds the TCP listener and spawns one task per
//! accepted connection.  Every task shares the server's stop signal, so a
//! single stop closes the listener and all open sessions.

pub mod server;

use std::net::SocketAddr;

use thiserror::Error;

/// Errors that can occur while setting up the listener.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("listener I/O error: {0}")]
    Io(#[from] std::io::Error),
}
