//! The request loop.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncWrite};

use crate::client::ClientConnector;
use crate::dispatch::CommandDispatcher;
use crate::events::{EventQueue, EventWriter};
use crate::lifecycle::LifecycleReporter;
use crate::transport::{LineReader, LineSink, TransportError};

/// Serves requests until the input ends.
///
/// Commands run strictly one after another and each response is written
/// before the next line is read. Queued events are written concurrently on
/// the same task, so they may appear between a request and its response.
/// When the input ends the event writer is cancelled and a client that is
/// still connected is disconnected.
///
/// # Errors
///
/// Returns an error when the input cannot be read or a response cannot be
/// written.
pub async fn run_worker<R, W, C>(
    mut reader: LineReader<R>,
    sink: LineSink<W>,
    mut dispatcher: CommandDispatcher<C>,
    queue: Arc<EventQueue>,
    reporter: Arc<dyn LifecycleReporter>,
) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: ClientConnector,
{
    let events = EventWriter::new(queue, sink.clone(), Arc::clone(&reporter));
    let result = tokio::select! {
        result = serve(&mut reader, &sink, &mut dispatcher) => result,
        () = events.run() => Ok(()),
    };

    dispatcher.close().await;
    reporter.worker_stopped();
    result
}

async fn serve<R, W, C>(
    reader: &mut LineReader<R>,
    sink: &LineSink<W>,
    dispatcher: &mut CommandDispatcher<C>,
) -> Result<(), TransportError>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    C: ClientConnector,
{
    while let Some(request) = reader.next_request().await? {
        let response = dispatcher.dispatch(&request).await;
        sink.write_line(&response).await?;
    }
    Ok(())
}
