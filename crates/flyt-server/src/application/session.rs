//! The per-connection request loop.
//!
//! ```text
//! loop:
//!   read   <request line>
//!   write  result:<code> message:"<text>"
//!   write  <data line or empty>
//!   flush
//! ```
//!
//! A request that fails to parse still gets both lines (`22 Invalid
//! argument` plus an empty data line), so the client's framing stays
//! aligned.  Only stream failures end the loop.

use flyt_core::{LineStream, ResultLine, StreamError};
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, warn};

use crate::application::dispatch::CommandDispatcher;

/// Serves requests until the peer closes, the stop signal fires, or the
/// stream fails.
///
/// # Errors
///
/// A clean close (at a line boundary, or by the stop signal) returns `Ok`.
/// Framing, oversize-line, and I/O failures are returned as [`StreamError`].
pub async fn serve_connection<S>(
    mut lines: LineStream<S>,
    dispatcher: &CommandDispatcher,
) -> Result<(), StreamError>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut served: u64 = 0;
    loop {
        let request = match lines.read_line().await {
            Ok(line) => line,
            Err(StreamError::Closed) => {
                debug!(served, "peer finished");
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        let reply = dispatcher.handle_line(&request).await;
        debug!(request = %request, code = reply.code(), "handled");

        lines.write_line(&encode_result(&reply.result)).await?;
        lines.write_line(reply.data.as_deref().unwrap_or("")).await?;
        lines.flush().await?;
        served += 1;
    }
}

fn encode_result(result: &ResultLine) -> String {
    match result.encode() {
        Ok(line) => line,
        Err(e) => {
            warn!(code = result.code, "sending result without message: {e}");
            format!("result:{} message:\"\"", result.code)
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::vehicle::{MockFrameSource, MockVehicleControl, VehicleError};
    use flyt_core::StopSource;
    use std::sync::Arc;
    use tokio_test::io::Builder;

    fn dispatcher(vehicle: MockVehicleControl) -> CommandDispatcher {
        let mut frames = MockFrameSource::new();
        frames.expect_latest_frame().returning(|| None);
        CommandDispatcher::new(Arc::new(vehicle), Arc::new(frames))
    }

    #[tokio::test]
    async fn test_each_request_gets_two_lines_in_order() {
        // Arrange
        let mut vehicle = MockVehicleControl::new();
        vehicle.expect_arm().times(1).returning(|| Ok(()));
        vehicle.expect_take_off().times(1).returning(|_| Ok(()));
        let mock = Builder::new()
            .read(b"arm\r\n")
            .write(b"result:0 message:\"Success\"\r\n\r\n")
            .read(b"take_off altitude:3\r\n")
            .write(b"result:0 message:\"Success\"\r\n\r\n")
            .build();
        let (_source, token) = StopSource::new();

        // Act
        let result = serve_connection(LineStream::new(mock, token), &dispatcher(vehicle)).await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_bad_request_does_not_end_session() {
        let mut vehicle = MockVehicleControl::new();
        vehicle.expect_disarm().times(1).returning(|| Ok(()));
        let mock = Builder::new()
            .read(b"fly_to_the_moon\r\n")
            .write(b"result:22 message:\"Invalid argument\"\r\n\r\n")
            .read(b"disarm\r\n")
            .write(b"result:0 message:\"Success\"\r\n\r\n")
            .build();
        let (_source, token) = StopSource::new();

        let result = serve_connection(LineStream::new(mock, token), &dispatcher(vehicle)).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_lone_lf_does_not_split_a_request() {
        // Arrange: the whole line is one malformed request, answered once.
        let mock = Builder::new()
            .read(b"arm\ndisarm\r\n")
            .write(b"result:22 message:\"Invalid argument\"\r\n\r\n")
            .build();
        let (_source, token) = StopSource::new();

        // Act
        let result =
            serve_connection(LineStream::new(mock, token), &dispatcher(MockVehicleControl::new()))
                .await;

        // Assert
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_vehicle_error_is_reported_on_the_wire() {
        let mut vehicle = MockVehicleControl::new();
        vehicle
            .expect_take_off()
            .returning(|_| Err(VehicleError::Rejected("not armed".into())));
        let mock = Builder::new()
            .read(b"take_off altitude:10\r\n")
            .write(b"result:5 message:\"Input/output error\"\r\n\r\n")
            .build();
        let (_source, token) = StopSource::new();

        let result = serve_connection(LineStream::new(mock, token), &dispatcher(vehicle)).await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_get_image_without_frame_on_the_wire() {
        let mock = Builder::new()
            .read(b"get_image\r\n")
            .write(b"result:63 message:\"Out of streams resources\"\r\n\r\n")
            .build();
        let (_source, token) = StopSource::new();

        let result =
            serve_connection(LineStream::new(mock, token), &dispatcher(MockVehicleControl::new()))
                .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_peer_closing_mid_request_is_framing_error() {
        let mock = Builder::new().read(b"take_off alti").build();
        let (_source, token) = StopSource::new();

        let result =
            serve_connection(LineStream::new(mock, token), &dispatcher(MockVehicleControl::new()))
                .await;

        assert!(matches!(result, Err(StreamError::Framing)));
    }

    #[tokio::test]
    async fn test_oversized_request_ends_session() {
        let long = format!("take_off altitude:{}\r\n", "1".repeat(64));
        let mock = Builder::new().read(long.as_bytes()).build();
        let (_source, token) = StopSource::new();
        let lines = LineStream::new(mock, token).with_max_line_len(32);

        let result = serve_connection(lines, &dispatcher(MockVehicleControl::new())).await;

        assert!(matches!(result, Err(StreamError::LineTooLong { limit: 32 })));
    }

    #[test]
    fn test_unquotable_message_is_sent_empty() {
        let line = encode_result(&ResultLine::new(5, "bad \"quote\""));
        assert_eq!(line, "result:5 message:\"\"");
    }
}
