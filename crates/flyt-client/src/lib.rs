//! flyt-client library entry point.
//!
//! Re-exports all public modules so that integration tests in `tests/`
//! and the binary entry point in `main.rs` share the same module tree.
//!
//! # What does flyt-client do?
//!
//! The *client* is the side that flies the vehicle.  A front-end (the CLI in
//! `main.rs`, or any other caller thread) builds [`Request`]s and hands them
//! to a [`Connection`].  The connection:
//!
//! 1. Opens the TCP socket synchronously, so `connect` either fully succeeds
//!    or fails without leaving anything running.
//! 2. Moves the socket into one task on the [`NetworkService`] runtime.
//! 3. Queues submitted requests and wakes the task, which writes each one,
//!    reads its two response lines, and resolves the caller's completion
//!    receiver, strictly in submission order.
//!
//! [`Request`]: application::session::Request
//! [`Connection`]: infrastructure::network::connection::Connection
//! [`NetworkService`]: infrastructure::network::service::NetworkService

/// Application layer: the per-command round trip.
pub mod application;

/// Infrastructure layer: runtime, sockets, queue, and configuration storage.
pub mod infrastructure;

pub use application::session::{CommandOutcome, ImageCallback, Request};
pub use infrastructure::network::connection::{Connection, ConnectionConfig};
pub use infrastructure::network::service::NetworkService;
pub use infrastructure::network::ConnectionError;
