//! Request line reader.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt};
use tracing::{debug, warn};

use msgbridge_protocol::Request;

use super::TransportError;

const TRANSPORT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::transport");

/// Longest accepted request line, excluding the newline.
pub const MAX_REQUEST_BYTES: usize = 1024 * 1024;

enum RawLine {
    Line,
    Oversized(usize),
    Eof,
}

/// Reads request envelopes from a line-delimited stream.
///
/// Blank lines are skipped silently. Lines that are not JSON request
/// envelopes, are not UTF-8, or exceed [`MAX_REQUEST_BYTES`] are logged and
/// discarded without producing a response.
#[derive(Debug)]
pub struct LineReader<R> {
    reader: R,
    buffer: Vec<u8>,
}

impl<R> LineReader<R>
where
    R: AsyncBufRead + Unpin,
{
    /// Wraps a buffered input stream.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
        }
    }

    /// Returns the next well-formed request, or `None` at end of input.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying stream fails.
    pub async fn next_request(&mut self) -> Result<Option<Request>, TransportError> {
        loop {
            match self.read_raw_line().await? {
                RawLine::Eof => return Ok(None),
                RawLine::Oversized(size) => {
                    warn!(
                        target: TRANSPORT_TARGET,
                        size,
                        max_size = MAX_REQUEST_BYTES,
                        "discarding oversized request line"
                    );
                }
                RawLine::Line => {
                    if let Some(request) = self.decode_buffer() {
                        return Ok(Some(request));
                    }
                }
            }
        }
    }

    fn decode_buffer(&self) -> Option<Request> {
        let Ok(line) = std::str::from_utf8(&self.buffer) else {
            debug!(target: TRANSPORT_TARGET, "discarding request line that is not UTF-8");
            return None;
        };
        if line.trim().is_empty() {
            return None;
        }
        match Request::parse(line) {
            Ok(request) => Some(request),
            Err(error) => {
                debug!(
                    target: TRANSPORT_TARGET,
                    error = %error,
                    "discarding malformed request line"
                );
                None
            }
        }
    }

    async fn read_raw_line(&mut self) -> Result<RawLine, TransportError> {
        self.buffer.clear();
        let limit = MAX_REQUEST_BYTES as u64 + 1;
        let read = (&mut self.reader)
            .take(limit)
            .read_until(b'\n', &mut self.buffer)
            .await?;
        if read == 0 {
            return Ok(RawLine::Eof);
        }
        if self.buffer.len() > MAX_REQUEST_BYTES && self.buffer.last() != Some(&b'\n') {
            let skipped = self.discard_rest_of_line().await?;
            return Ok(RawLine::Oversized(self.buffer.len() + skipped));
        }
        Ok(RawLine::Line)
    }

    async fn discard_rest_of_line(&mut self) -> Result<usize, TransportError> {
        let mut skipped = 0;
        loop {
            let chunk = self.reader.fill_buf().await?;
            if chunk.is_empty() {
                return Ok(skipped);
            }
            let (consumed, done) = match chunk.iter().position(|byte| *byte == b'\n') {
                Some(index) => (index + 1, true),
                None => (chunk.len(), false),
            };
            self.reader.consume(consumed);
            skipped += consumed;
            if done {
                return Ok(skipped);
            }
        }
    }
}
