//! Shared, line-atomic output stream.

use std::sync::Arc;

use serde::Serialize;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::Mutex;

use super::TransportError;

/// Writer shared by the command loop and the event writer.
///
/// Each message is serialized before the lock is taken and written as one
/// line followed by a flush, so lines never interleave.
#[derive(Debug)]
pub struct LineSink<W> {
    writer: Arc<Mutex<W>>,
}

impl<W> Clone for LineSink<W> {
    fn clone(&self) -> Self {
        Self {
            writer: Arc::clone(&self.writer),
        }
    }
}

impl<W> LineSink<W>
where
    W: AsyncWrite + Unpin,
{
    /// Wraps an output stream.
    pub fn new(writer: W) -> Self {
        Self {
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Serializes `message` and writes it as a single line.
    ///
    /// # Errors
    ///
    /// Returns an error when serialization, writing, or flushing fails.
    pub async fn write_line<T>(&self, message: &T) -> Result<(), TransportError>
    where
        T: Serialize + ?Sized,
    {
        let mut line = serde_json::to_vec(message)?;
        line.push(b'\n');

        let mut writer = self.writer.lock().await;
        writer.write_all(&line).await?;
        writer.flush().await?;
        Ok(())
    }

    /// Runs `inspect` against the underlying writer.
    pub async fn with_writer<R>(&self, inspect: impl FnOnce(&W) -> R) -> R {
        let writer = self.writer.lock().await;
        inspect(&writer)
    }
}
