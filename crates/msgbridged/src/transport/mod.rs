//! Line-delimited JSON framing over the worker's standard streams.
//!
//! [`LineReader`] turns stdin into a stream of request envelopes and
//! [`LineSink`] serializes responses and events onto stdout, one complete
//! line at a time.

mod reader;
mod sink;

use std::io;

use thiserror::Error;

pub use reader::{LineReader, MAX_REQUEST_BYTES};
pub use sink::LineSink;

/// Failures on the standard streams.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Reading or writing a stream failed.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// A message could not be serialized.
    #[error("failed to serialize output line: {0}")]
    Serialize(#[from] serde_json::Error),
}
