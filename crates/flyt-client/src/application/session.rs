//! One command round trip on an established line stream.
//!
//! ```text
//! write  <command line>\r\n   (flushed before anything is read)
//! read   result:<int> message:"<text>"
//! read   <data line>          (always read, even if the result line is bad)
//! ```
//!
//! Reading the data line unconditionally keeps request/response framing
//! aligned for the next command.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use flyt_core::{Command, Image, ImageResponse, LineStream, ProtocolError, ResultLine, StreamError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

/// Called with each decoded camera frame.  Runs on a runtime worker thread.
pub type ImageCallback = Arc<dyn Fn(Image) + Send + Sync>;

/// What a submitted command resolves to after its round trip.
///
/// `Err` means the result line itself did not parse; the connection is still
/// usable.
pub type CommandOutcome = Result<ResultLine, ProtocolError>;

/// A command plus what to do with data it returns.
#[derive(Clone)]
pub struct Request {
    pub command: Command,
    pub on_image: Option<ImageCallback>,
}

impl Request {
    pub fn new(command: Command) -> Self {
        Self {
            command,
            on_image: None,
        }
    }

    /// Registers the callback a `get_image` response is delivered to.
    pub fn with_image_callback(mut self, callback: impl Fn(Image) + Send + Sync + 'static) -> Self {
        self.on_image = Some(Arc::new(callback));
        self
    }
}

impl From<Command> for Request {
    fn from(command: Command) -> Self {
        Self::new(command)
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Request")
            .field("command", &self.command)
            .field("on_image", &self.on_image.is_some())
            .finish()
    }
}

/// Performs one command's full round trip.
///
/// # Errors
///
/// Only transport failures are returned as `Err`; they end the session.
/// A malformed result line is reported inside the [`CommandOutcome`].
pub async fn round_trip<S>(
    stream: &mut LineStream<S>,
    request: &Request,
) -> Result<CommandOutcome, StreamError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let started = Instant::now();
    let name = request.command.name();

    stream.write_line(&request.command.encode()).await?;
    stream.flush().await?;

    let result_line = stream.read_line().await?;
    let data_line = stream.read_line().await?;

    let outcome = ResultLine::parse(&result_line);
    match &outcome {
        Ok(result) if result.is_success() => {}
        Ok(result) => debug!(command = name, code = result.code, reason = %result.message, "command failed"),
        Err(e) => warn!(command = name, line = %result_line, "unparseable result line: {e}"),
    }

    if let (Command::GetImage, Some(callback)) = (&request.command, &request.on_image) {
        deliver_image(&data_line, callback);
    }

    debug!(
        command = name,
        elapsed_us = started.elapsed().as_micros() as u64,
        "round trip complete"
    );
    Ok(outcome)
}

/// Decodes a `get_image` data line and calls back only if it decodes.
fn deliver_image(data_line: &str, callback: &ImageCallback) {
    match ImageResponse::parse(data_line).and_then(|response| response.decode()) {
        Ok(image) => callback(image),
        Err(e) => debug!("dropping camera frame: {e}"),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
