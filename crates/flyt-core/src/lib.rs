//! # flyt-core
//!
//! Shared library for the flyt remote-control link containing the text wire
//! grammar, the command and response models, the base32 payload codec, and
//! the line stream engine that both ends of a connection run their I/O on.
//!
//! This crate is used by both the client and the server applications.
//! It never opens sockets itself: [`protocol::stream::LineStream`] is generic
//! over any `AsyncRead + AsyncWrite` transport.
//!
//! # Architecture overview
//!
//! A client asks a simulated aerial vehicle to arm, take off, fly to
//! setpoints, land, or send back a camera frame.  Every request is one text
//! line, every response is exactly two lines:
//!
//! ```text
//! client                                   server
//! ──────                                   ──────
//! take_off altitude:12.5\r\n        ──▶
//!                                   ◀──    result:0 message:"Success"\r\n
//!                                   ◀──    \r\n
//! ```
//!
//! - **`protocol::base32`** – reversible bytes ↔ 32-symbol text encoding used
//!   to embed camera frames inside a text line.
//! - **`protocol::grammar`** – the cursor that scans and formats individual
//!   fields (`key:value`, floats, booleans, `{x,y,z}` vectors, quoted text).
//! - **`protocol::command`** – the closed set of commands as one enum.
//! - **`protocol::response`** – the result line and the image data line.
//! - **`protocol::stream`** – buffered CRLF line reader/writer that suspends
//!   on the socket instead of blocking a thread.
//! - **`protocol::stop`** – the stop signal every pending read/write races.

pub mod protocol;

pub use protocol::base32::Base32Error;
pub use protocol::command::{Command, Vector3};
pub use protocol::error::ProtocolError;
pub use protocol::response::{Image, ImageResponse, ResultCode, ResultLine};
pub use protocol::stop::{StopSource, StopToken};
pub use protocol::stream::{LineStream, StreamError};

/// TCP port the server listens on unless configured otherwise.
pub const DEFAULT_PORT: u16 = 12321;
