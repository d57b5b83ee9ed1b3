//! Response lines: the result line every command gets, and the image data
//! line that follows a successful `get_image`.
//!
//! ```text
//! result:<int> message:"<text>"
//! width:<int> height:<int> size:<int> data:<base32>
//! ```
//!
//! Every response is exactly two lines.  The second line is empty unless the
//! command returns data.

use std::fmt;

use crate::protocol::base32;
use crate::protocol::error::ProtocolError;
use crate::protocol::grammar::Cursor;

/// Status codes the server puts on the result line.
///
/// The numeric values follow POSIX `errno` so that the message text matches
/// what `strerror` prints on the vehicle computer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResultCode {
    Success,
    /// `EIO`: the vehicle-control service call failed.
    IoError,
    /// `EINVAL`: the request did not parse.
    InvalidArgument,
    /// `ENOSR`: the requested resource (a camera frame) is not available yet.
    NoResource,
}

impl ResultCode {
    pub const fn code(self) -> i32 {
        match self {
            Self::Success => 0,
            Self::IoError => 5,
            Self::InvalidArgument => 22,
            Self::NoResource => 63,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            Self::Success => "Success",
            Self::IoError => "Input/output error",
            Self::InvalidArgument => "Invalid argument",
            Self::NoResource => "Out of streams resources",
        }
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            5 => Some(Self::IoError),
            22 => Some(Self::InvalidArgument),
            63 => Some(Self::NoResource),
            _ => None,
        }
    }
}

impl fmt::Display for ResultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// ── Result line ──────────────────────────────────────────────────────────────

/// The first response line: a status code and a human-readable message.
///
/// The code is kept as a raw integer so that codes this build does not know
/// about survive a round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultLine {
    pub code: i32,
    pub message: String,
}

impl ResultLine {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// `true` when the code is zero.
    pub fn is_success(&self) -> bool {
        self.code == 0
    }

    /// The known status this code maps to, if any.
    pub fn result_code(&self) -> Option<ResultCode> {
        ResultCode::from_code(self.code)
    }

    /// Parses `result:<int> message:"<text>"`.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if the line does not match.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flyt_core::ResultLine;
    ///
    /// let line = ResultLine::parse(r#"result:0 message:"""#).unwrap();
    /// assert_eq!(line, ResultLine::new(0, ""));
    /// ```
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut cursor = Cursor::new(line);
        cursor.expect_key("result")?;
        let code = cursor.int()?;
        cursor.expect_key("message")?;
        let message = cursor.quoted()?.to_owned();
        cursor.finish()?;
        Ok(Self { code, message })
    }

    /// Encodes the line without its CRLF terminator.
    ///
    /// # Errors
    ///
    /// Messages are written without escaping, so a message containing `"`,
    /// CR, or LF is refused with [`ProtocolError::InvalidArgument`].
    pub fn encode(&self) -> Result<String, ProtocolError> {
        if self.message.contains(['"', '\r', '\n']) {
            return Err(ProtocolError::InvalidArgument(format!(
                "message cannot be quoted without escaping: {:?}",
                self.message
            )));
        }
        Ok(format!("result:{} message:\"{}\"", self.code, self.message))
    }
}

impl From<ResultCode> for ResultLine {
    fn from(code: ResultCode) -> Self {
        Self::new(code.code(), code.message())
    }
}

// ── Image ────────────────────────────────────────────────────────────────────

/// A decoded camera frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// The data line describing one camera frame.
///
/// `size` is the payload length in bytes *before* encoding; it is what the
/// base32 decoder uses as the expected length.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageResponse {
    pub width: i32,
    pub height: i32,
    pub size: i32,
    pub data: String,
}

impl ImageResponse {
    /// Encodes `image` for the wire.
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::InvalidArgument`] if a dimension or the
    /// payload length does not fit an `i32`.
    pub fn from_image(image: &Image) -> Result<Self, ProtocolError> {
        Ok(Self {
            width: to_wire_int(image.width as usize, "width")?,
            height: to_wire_int(image.height as usize, "height")?,
            size: to_wire_int(image.data.len(), "size")?,
            data: base32::encode(&image.data),
        })
    }

    /// Parses `width:<int> height:<int> size:<int> data:<base32>`.
    ///
    /// The data field runs to the end of the line; its symbols are only
    /// checked by [`ImageResponse::decode`].
    ///
    /// # Errors
    ///
    /// Returns [`ProtocolError::Parse`] if the line does not match.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let mut cursor = Cursor::new(line);
        cursor.expect_key("width")?;
        let width = cursor.int()?;
        cursor.expect_key("height")?;
        let height = cursor.int()?;
        cursor.expect_key("size")?;
        let size = cursor.int()?;
        cursor.expect_key("data")?;
        let data = cursor.rest_of_line().to_owned();
        Ok(Self {
            width,
            height,
            size,
            data,
        })
    }

    /// Encodes the line without its CRLF terminator.
    pub fn encode(&self) -> String {
        format!(
            "width:{} height:{} size:{} data:{}",
            self.width, self.height, self.size, self.data
        )
    }

    /// Decodes the payload into an [`Image`].
    ///
    /// # Errors
    ///
    /// - [`ProtocolError::InvalidArgument`] for a negative dimension or size.
    /// - [`ProtocolError::Payload`] when the base32 text does not decode to
    ///   exactly `size` bytes.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use flyt_core::ImageResponse;
    ///
    /// let line = ImageResponse::parse("width:2 height:1 size:3 data:AAAAA").unwrap();
    /// assert_eq!(line.decode().unwrap().data, vec![0, 0, 0]);
    /// ```
    pub fn decode(&self) -> Result<Image, ProtocolError> {
        let width = from_wire_int(self.width, "width")?;
        let height = from_wire_int(self.height, "height")?;
        let size = from_wire_int(self.size, "size")?;
        let data = base32::decode(&self.data, size as usize)?;
        Ok(Image {
            width,
            height,
            data,
        })
    }
}

fn to_wire_int(value: usize, field: &str) -> Result<i32, ProtocolError> {
    i32::try_from(value)
        .map_err(|_| ProtocolError::InvalidArgument(format!("{field} {value} does not fit the wire")))
}

fn from_wire_int(value: i32, field: &str) -> Result<u32, ProtocolError> {
    u32::try_from(value)
        .map_err(|_| ProtocolError::InvalidArgument(format!("negative {field}: {value}")))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
