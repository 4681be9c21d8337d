//! Newline-delimited JSON framing over a byte stream.
//!
//! [`LineReader`] keeps any partially received line in its own buffer, so
//! [`LineReader::next_line`] can be used as a `tokio::select!` branch and
//! cancelled between ticks without losing input. Lines longer than
//! [`MAX_LINE_BYTES`] are discarded up to the next newline and reported as
//! [`ProtocolError::TooLong`].

use fleetlink_types::protocol::{self, ProtocolError, ServerMessage};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

/// Longest accepted protocol line, excluding the newline.
pub const MAX_LINE_BYTES: usize = 8 * 1024;

/// One received line, or the reason it was rejected.
pub type Frame = Result<String, ProtocolError>;

/// Cancel-safe line reader.
#[derive(Debug)]
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
    overflow: bool,
    limit: usize,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    /// Wrap a reader with the default line limit.
    pub fn new(reader: R) -> Self {
        Self::with_limit(reader, MAX_LINE_BYTES)
    }

    /// Wrap a reader with a custom line limit.
    pub fn with_limit(reader: R, limit: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
            overflow: false,
            limit,
        }
    }

    /// Read the next line.
    ///
    /// Returns `Ok(None)` at end of stream. A final line without a
    /// trailing newline is still delivered.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error if the read fails.
    pub async fn next_line(&mut self) -> std::io::Result<Option<Frame>> {
        loop {
            let available = self.inner.fill_buf().await?;
            if available.is_empty() {
                if self.buf.is_empty() && !self.overflow {
                    return Ok(None);
                }
                return Ok(Some(self.take_frame()));
            }

            let newline = available.iter().position(|&b| b == b'\n');
            let chunk = newline.map_or(available, |end| available.split_at(end).0);
            let consumed = newline.map_or(chunk.len(), |end| end.saturating_add(1));

            if !self.overflow {
                if self.buf.len().saturating_add(chunk.len()) > self.limit {
                    self.overflow = true;
                    self.buf.clear();
                } else {
                    self.buf.extend_from_slice(chunk);
                }
            }
            self.inner.consume(consumed);

            if newline.is_some() {
                return Ok(Some(self.take_frame()));
            }
        }
    }

    fn take_frame(&mut self) -> Frame {
        let bytes = std::mem::take(&mut self.buf);
        if std::mem::replace(&mut self.overflow, false) {
            return Err(ProtocolError::TooLong { limit: self.limit });
        }
        String::from_utf8(bytes)
            .map_err(|e| ProtocolError::Malformed(format!("invalid UTF-8: {}", e.utf8_error())))
    }
}

/// Write one message followed by a newline and flush.
///
/// # Errors
///
/// Returns an I/O error if encoding or writing fails.
pub async fn write_message<W>(writer: &mut W, message: &ServerMessage) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let mut line = protocol::encode_message(message)?;
    line.push('\n');
    writer.write_all(line.as_bytes()).await?;
    writer.flush().await
}
