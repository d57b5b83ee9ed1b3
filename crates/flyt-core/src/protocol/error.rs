//! Grammar-level error type shared by the command and response parsers.

use thiserror::Error;

use crate::protocol::base32::Base32Error;

/// Errors produced while parsing or formatting a protocol line.
///
/// These are *grammar* failures: the bytes arrived intact but do not have the
/// expected shape.  Transport failures are reported separately as
/// [`crate::protocol::stream::StreamError`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// The line does not match the grammar at byte `offset`.
    #[error("parse error at offset {offset}: expected {expected}")]
    Parse { expected: &'static str, offset: usize },

    /// The line parsed but a decoded value is out of its expected shape.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// An image data line carried a base32 payload that does not decode.
    #[error("image payload: {0}")]
    Payload(#[from] Base32Error),
}
