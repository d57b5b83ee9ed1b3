//! Buffered CRLF line reader/writer over an async byte stream.
//!
//! [`LineStream`] gives a session loop blocking-style `read_line` /
//! `write_line` calls while every socket wait is an `.await` point raced
//! against a [`StopToken`].  It owns one fixed read buffer and one fixed
//! write buffer of [`BUFFER_SIZE`] bytes each; the write buffer is drained to
//! the socket whenever it fills and on [`LineStream::flush`].
//!
//! Only one task may own a `LineStream`: it is moved into the connection
//! task rather than shared.

use std::io;

use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tracing::trace;

use crate::protocol::stop::StopToken;

/// Size of each of the fixed read and write buffers.
pub const BUFFER_SIZE: usize = 8192;

/// Default cap on the length of one incoming line (terminator excluded).
///
/// Large enough for a base32-encoded camera frame.
pub const DEFAULT_MAX_LINE_LEN: usize = 16 * 1024 * 1024;

/// Transport-level failures.  Any of these ends the session that saw it.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The peer closed at a line boundary, or the stop signal fired.
    #[error("stream closed")]
    Closed,

    /// The peer closed the connection in the middle of a line.
    #[error("connection closed in the middle of a line")]
    Framing,

    /// An incoming line exceeded the configured budget.
    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Line-oriented view of one connection's byte stream.
#[derive(Debug)]
pub struct LineStream<S> {
    io: S,
    stop: StopToken,
    read_buf: Box<[u8; BUFFER_SIZE]>,
    read_pos: usize,
    read_end: usize,
    write_buf: Vec<u8>,
    max_line_len: usize,
}

impl<S> LineStream<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(io: S, stop: StopToken) -> Self {
        Self {
            io,
            stop,
            read_buf: Box::new([0; BUFFER_SIZE]),
            read_pos: 0,
            read_end: 0,
            write_buf: Vec::with_capacity(BUFFER_SIZE),
            max_line_len: DEFAULT_MAX_LINE_LEN,
        }
    }

    /// Sets the incoming line budget.
    pub fn with_max_line_len(mut self, max_line_len: usize) -> Self {
        self.max_line_len = max_line_len;
        self
    }

    /// Gives the transport back, discarding anything still buffered.
    pub fn into_inner(self) -> S {
        self.io
    }

    /// Reads the next line and returns it without its terminator.
    ///
    /// Only the pair CR LF ends a line; a lone CR or LF is kept as part of
    /// the line.  Bytes that are not valid UTF-8 are replaced with U+FFFD
    /// rather than failing the read, so the grammar sees them and reports a
    /// parse error instead.
    ///
    /// # Errors
    ///
    /// - [`StreamError::Closed`] on a clean close before any byte of a new
    ///   line, or when the stop signal fires.
    /// - [`StreamError::Framing`] when the peer closes mid-line.
    /// - [`StreamError::LineTooLong`] when the line grows past the budget.
    /// - [`StreamError::Io`] on socket errors.
    pub async fn read_line(&mut self) -> Result<String, StreamError> {
        let mut line = Vec::new();
        loop {
            let buffered = &self.read_buf[self.read_pos..self.read_end];
            match buffered.iter().position(|&b| b == b'\n') {
                Some(newline) => {
                    line.extend_from_slice(&buffered[..=newline]);
                    self.read_pos += newline + 1;
                    if line.ends_with(b"\r\n") {
                        line.truncate(line.len() - 2);
                        if line.len() > self.max_line_len {
                            return Err(StreamError::LineTooLong {
                                limit: self.max_line_len,
                            });
                        }
                        return Ok(String::from_utf8_lossy(&line).into_owned());
                    }
                }
                None => {
                    line.extend_from_slice(buffered);
                    self.read_pos = self.read_end;
                }
            }

            // One extra byte may be the CR of the terminator.
            if line.len() > self.max_line_len + 1 {
                return Err(StreamError::LineTooLong {
                    limit: self.max_line_len,
                });
            }

            if self.read_pos == self.read_end && self.fill().await? == 0 {
                return Err(if line.is_empty() {
                    StreamError::Closed
                } else {
                    StreamError::Framing
                });
            }
        }
    }

    /// Refills the read buffer, suspending until the socket has data.
    async fn fill(&mut self) -> Result<usize, StreamError> {
        self.read_pos = 0;
        self.read_end = 0;
        loop {
            let result = tokio::select! {
                biased;
                _ = self.stop.stopped() => return Err(StreamError::Closed),
                result = self.io.read(&mut self.read_buf[..]) => result,
            };
            match result {
                Ok(n) => {
                    trace!(bytes = n, "read");
                    self.read_end = n;
                    return Ok(n);
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Buffers `line` followed by CRLF.
    ///
    /// Nothing is guaranteed to reach the socket until [`LineStream::flush`].
    pub async fn write_line(&mut self, line: &str) -> Result<(), StreamError> {
        self.write_all(line.as_bytes()).await?;
        self.write_all(b"\r\n").await
    }

    /// Buffers raw bytes, draining the buffer to the socket each time it fills.
    pub async fn write_all(&mut self, mut bytes: &[u8]) -> Result<(), StreamError> {
        while !bytes.is_empty() {
            let room = BUFFER_SIZE - self.write_buf.len();
            if room == 0 {
                self.drain().await?;
                continue;
            }
            let take = room.min(bytes.len());
            self.write_buf.extend_from_slice(&bytes[..take]);
            bytes = &bytes[take..];
        }
        Ok(())
    }

    /// Writes every buffered byte and flushes the transport.
    ///
    /// # Errors
    ///
    /// [`StreamError::Closed`] if the stop signal fires first,
    /// [`StreamError::Io`] on socket errors (a zero-length write included).
    pub async fn flush(&mut self) -> Result<(), StreamError> {
        self.drain().await?;
        tokio::select! {
            biased;
            _ = self.stop.stopped() => Err(StreamError::Closed),
            result = self.io.flush() => result.map_err(StreamError::from),
        }
    }

    /// Hands the write buffer to the socket, retrying partial writes.
    async fn drain(&mut self) -> Result<(), StreamError> {
        let mut written = 0;
        while written < self.write_buf.len() {
            let result = tokio::select! {
                biased;
                _ = self.stop.stopped() => return Err(StreamError::Closed),
                result = self.io.write(&self.write_buf[written..]) => result,
            };
            match result {
                Ok(0) => return Err(io::Error::from(io::ErrorKind::WriteZero).into()),
                Ok(n) => {
                    trace!(bytes = n, "wrote");
                    written += n;
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
        self.write_buf.clear();
        Ok(())
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::stop::StopSource;
    use std::time::Duration;
    use tokio_test::io::Builder;

    #[tokio::test]
    async fn test_read_line_strips_crlf() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new().read(b"arm\r\ndisarm\r\n").build();
        let mut stream = LineStream::new(mock, token);

        assert_eq!(stream.read_line().await.unwrap(), "arm");
        assert_eq!(stream.read_line().await.unwrap(), "disarm");
        assert!(matches!(stream.read_line().await, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn test_read_line_reassembles_split_reads() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new()
            .read(b"take_")
            .read(b"off altitude:1\r")
            .read(b"\n\r\n")
            .build();
        let mut stream = LineStream::new(mock, token);

        assert_eq!(stream.read_line().await.unwrap(), "take_off altitude:1");
        assert_eq!(stream.read_line().await.unwrap(), "");
    }

    #[tokio::test]
    async fn test_read_line_keeps_lone_lf_inside_the_line() {
        // Arrange
        let (_source, token) = StopSource::new();
        let mock = Builder::new().read(b"arm\ndisarm\r\n").build();
        let mut stream = LineStream::new(mock, token);

        // Act
        let line = stream.read_line().await.unwrap();

        // Assert
        assert_eq!(line, "arm\ndisarm");
        assert!(matches!(stream.read_line().await, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn test_read_line_keeps_lone_cr_and_split_lf() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new()
            .read(b"a\rb\n")
            .read(b"c\r")
            .read(b"\n")
            .build();
        let mut stream = LineStream::new(mock, token);

        assert_eq!(stream.read_line().await.unwrap(), "a\rb\nc");
    }

    #[tokio::test]
    async fn test_read_line_lf_only_stream_is_framing_error_at_close() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new().read(b"arm\n").build();
        let mut stream = LineStream::new(mock, token);

        assert!(matches!(stream.read_line().await, Err(StreamError::Framing)));
    }

    #[tokio::test]
    async fn test_read_line_close_mid_line_is_framing_error() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new().read(b"result:0 mess").build();
        let mut stream = LineStream::new(mock, token);

        assert!(matches!(stream.read_line().await, Err(StreamError::Framing)));
    }

    #[tokio::test]
    async fn test_read_line_over_budget_is_rejected() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new().read(b"0123456789\r\n").build();
        let mut stream = LineStream::new(mock, token).with_max_line_len(4);

        assert!(matches!(
            stream.read_line().await,
            Err(StreamError::LineTooLong { limit: 4 })
        ));
    }

    #[tokio::test]
    async fn test_read_line_at_budget_is_accepted() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new().read(b"1234\r\n").build();
        let mut stream = LineStream::new(mock, token).with_max_line_len(4);

        assert_eq!(stream.read_line().await.unwrap(), "1234");
    }

    #[tokio::test]
    async fn test_read_line_longer_than_read_buffer() {
        let (_source, token) = StopSource::new();
        let long = "A".repeat(BUFFER_SIZE * 3 + 17);
        let wire = format!("{long}\r\n");
        let mock = Builder::new().read(wire.as_bytes()).build();
        let mut stream = LineStream::new(mock, token);

        assert_eq!(stream.read_line().await.unwrap(), long);
    }

    #[tokio::test]
    async fn test_read_line_replaces_invalid_utf8() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new().read(b"ar\xFFm\r\n").build();
        let mut stream = LineStream::new(mock, token);

        assert_eq!(stream.read_line().await.unwrap(), "ar\u{FFFD}m");
    }

    #[tokio::test]
    async fn test_read_line_returns_closed_when_stopped() {
        let (source, token) = StopSource::new();
        let (client, _server) = tokio::io::duplex(64);
        let mut stream = LineStream::new(client, token);

        let reader = tokio::spawn(async move { stream.read_line().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        source.stop();

        let result = tokio::time::timeout(Duration::from_secs(1), reader)
            .await
            .expect("read did not observe stop")
            .unwrap();
        assert!(matches!(result, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn test_write_line_is_buffered_until_flush() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new().write(b"arm\r\nget_image\r\n").build();
        let mut stream = LineStream::new(mock, token);

        stream.write_line("arm").await.unwrap();
        stream.write_line("get_image").await.unwrap();
        stream.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_write_all_drains_when_buffer_fills() {
        let (_source, token) = StopSource::new();
        let payload = vec![b'Q'; BUFFER_SIZE + 100];
        let mock = Builder::new()
            .write(&payload[..BUFFER_SIZE])
            .write(&payload[BUFFER_SIZE..])
            .build();
        let mut stream = LineStream::new(mock, token);

        stream.write_all(&payload).await.unwrap();
        stream.flush().await.unwrap();
    }

    #[tokio::test]
    async fn test_flush_returns_closed_when_stopped() {
        let (source, token) = StopSource::new();
        // A one-byte pipe nobody reads from: the drain can never finish.
        let (client, _server) = tokio::io::duplex(1);
        let mut stream = LineStream::new(client, token);
        stream.write_line("position_setpoint position:{0,0,0}").await.unwrap();

        let writer = tokio::spawn(async move { stream.flush().await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        source.stop();

        let result = tokio::time::timeout(Duration::from_secs(1), writer)
            .await
            .expect("flush did not observe stop")
            .unwrap();
        assert!(matches!(result, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn test_write_error_surfaces_as_io() {
        let (_source, token) = StopSource::new();
        let mock = Builder::new()
            .write_error(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
            .build();
        let mut stream = LineStream::new(mock, token);

        stream.write_line("arm").await.unwrap();
        match stream.flush().await {
            Err(StreamError::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::BrokenPipe),
            other => panic!("expected Io error, got {other:?}"),
        }
    }
}
