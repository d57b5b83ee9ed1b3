//! Protocol module containing the wire grammar, message models, codec, and
//! the line stream engine.

pub mod base32;
pub mod command;
pub mod error;
pub mod grammar;
pub mod response;
pub mod stop;
pub mod stream;

pub use command::{Command, Vector3};
pub use error::ProtocolError;
pub use response::{Image, ImageResponse, ResultCode, ResultLine};
pub use stream::{LineStream, StreamError};
