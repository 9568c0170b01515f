//! Background activity draining the event queue to stdout.

use std::sync::Arc;

use tokio::io::AsyncWrite;

use msgbridge_protocol::EventEnvelope;

use super::EventQueue;
use crate::lifecycle::LifecycleReporter;
use crate::transport::LineSink;

const EVENTS_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::events");

/// Writes queued events as `{"event": ...}` lines.
///
/// A failed write is logged and the writer moves on to the next event.
pub struct EventWriter<W> {
    queue: Arc<EventQueue>,
    sink: LineSink<W>,
    reporter: Arc<dyn LifecycleReporter>,
    reported_drops: u64,
}

impl<W> EventWriter<W>
where
    W: AsyncWrite + Unpin,
{
    /// Creates a writer for `queue` sharing `sink` with the command loop.
    pub fn new(
        queue: Arc<EventQueue>,
        sink: LineSink<W>,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Self {
        Self {
            queue,
            sink,
            reporter,
            reported_drops: 0,
        }
    }

    /// Drains the queue until the future is dropped.
    pub async fn run(mut self) {
        loop {
            self.write_next().await;
        }
    }

    /// Waits for one event and writes it.
    pub async fn write_next(&mut self) {
        let event = self.queue.pop().await;
        self.report_drops();
        let envelope = EventEnvelope::from(event);
        if let Err(error) = self.sink.write_line(&envelope).await {
            tracing::error!(
                target: EVENTS_TARGET,
                error = %error,
                message_id = envelope.event.message.id,
                chat_id = envelope.event.message.chat_id,
                "failed to write event line"
            );
        }
    }

    fn report_drops(&mut self) {
        let total = self.queue.dropped();
        if total > self.reported_drops {
            self.reporter
                .events_dropped(total - self.reported_drops, total);
            self.reported_drops = total;
        }
    }
}
