//! The full request loop over in-memory pipes.

use std::io;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use rstest::rstest;
use serde_json::json;
use tokio::io::AsyncWrite;

use msgbridge_protocol::{Event, EventKind, OutputLine};

use super::support::{
    FakeBackend, LifecycleEvent, RecordingLifecycleReporter, message, spawn_worker, user,
};
use crate::events::{EVENT_QUEUE_CAPACITY, EventQueue, EventWriter, message_view};
use crate::transport::LineSink;

fn reporter() -> Arc<RecordingLifecycleReporter> {
    Arc::new(RecordingLifecycleReporter::default())
}

#[rstest]
#[tokio::test]
async fn responses_stay_in_request_order_around_events() {
    let backend = FakeBackend::new()
        .authorized_as(user())
        .echoing_sent_messages();
    let (worker, mut parent) = spawn_worker(&backend, reporter());

    let driver = async move {
        parent
            .send("a", "send_message", json!({"chat_id": 5, "text": "one"}))
            .await;
        parent.send("b", "state", json!({})).await;
        let mut lines = Vec::new();
        for _ in 0..3 {
            lines.push(parent.next_output().await);
        }
        (lines, parent.close().await)
    };
    let (result, (lines, rest)) = tokio::join!(worker, driver);
    result.expect("worker exits cleanly");

    let response_ids: Vec<String> = lines
        .iter()
        .filter_map(|line| match line {
            OutputLine::Response(response) => Some(response.id.clone()),
            OutputLine::Event(_) => None,
        })
        .collect();
    assert_eq!(response_ids, vec!["a", "b"]);

    let events: Vec<&Event> = lines
        .iter()
        .filter_map(|line| match line {
            OutputLine::Event(envelope) => Some(&envelope.event),
            OutputLine::Response(_) => None,
        })
        .collect();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].kind, EventKind::Message);
    assert!(events[0].message.is_outgoing);
    assert_eq!(events[0].message.text, "one");
    assert!(rest.is_empty(), "unexpected trailing output: {rest:?}");
}

#[rstest]
#[case("")]
#[case("42")]
#[case("req-ünïcödé")]
#[tokio::test]
async fn responses_echo_the_request_id(#[case] id: &str) {
    let backend = FakeBackend::new();
    let (worker, mut parent) = spawn_worker(&backend, reporter());
    let id = id.to_owned();

    let driver = async move {
        parent.send(&id, "state", json!({})).await;
        parent.send(&id, "bogus", json!({})).await;
        let first = parent.next_response().await;
        let second = parent.next_response().await;
        parent.close().await;
        (id, first, second)
    };
    let (result, (id, first, second)) = tokio::join!(worker, driver);
    result.expect("worker exits cleanly");
    assert_eq!(first.id, id);
    assert!(first.ok);
    assert_eq!(second.id, id);
    assert!(!second.ok);
}

#[rstest]
#[tokio::test]
async fn malformed_lines_produce_no_output() {
    let backend = FakeBackend::new();
    let (worker, mut parent) = spawn_worker(&backend, reporter());

    let driver = async move {
        parent.send_line("not json at all").await;
        parent.send_line("{\"id\":").await;
        parent.send_line("").await;
        parent.send_line("[\"state\"]").await;
        parent.send_line("[\"1\",\"shutdown\"]").await;
        parent.send("ok", "state", json!({})).await;
        let first = parent.next_output().await;
        (first, parent.close().await)
    };
    let (result, (first, rest)) = tokio::join!(worker, driver);
    result.expect("worker exits cleanly");

    let response = first.into_response().expect("first line is a response");
    assert_eq!(response.id, "ok");
    assert!(rest.is_empty());
}

#[rstest]
#[tokio::test]
async fn objects_with_unusual_field_types_are_answered() {
    let backend = FakeBackend::new();
    let (worker, mut parent) = spawn_worker(&backend, reporter());

    let driver = async move {
        parent.send_line(r#"{"id":5,"command":"state"}"#).await;
        parent.send_line(r#"{"id":null,"command":"state"}"#).await;
        parent.send_line(r#"{"id":"c","command":7}"#).await;
        parent
            .send_line(r#"{"id":"p","command":"send_phone","payload":"x"}"#)
            .await;
        let mut responses = Vec::new();
        for _ in 0..4 {
            responses.push(parent.next_response().await);
        }
        (responses, parent.close().await)
    };
    let (result, (responses, rest)) = tokio::join!(worker, driver);
    result.expect("worker exits cleanly");

    let summary: Vec<_> = responses
        .iter()
        .map(|response| (response.id.as_str(), response.ok, response.error.as_deref()))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("5", true, None),
            ("", true, None),
            ("c", false, Some("Unknown command: 7")),
            ("p", false, Some("payload must be an object")),
        ]
    );
    assert!(rest.is_empty());
    assert_eq!(backend.connects(), 0);
}

#[rstest]
#[tokio::test]
async fn end_of_input_disconnects_a_live_client() {
    let backend = FakeBackend::new().authorized_as(user());
    let reporter = reporter();
    let (worker, mut parent) = spawn_worker(&backend, reporter.clone());

    let driver = async move {
        parent.send("u", "start_updates", json!({})).await;
        let response = parent.next_response().await;
        parent.close().await;
        response
    };
    let (result, response) = tokio::join!(worker, driver);
    result.expect("worker exits cleanly");

    assert_eq!(response.payload, Some(json!({"status": "listening"})));
    assert!(backend.called("disconnect"));
    assert_eq!(backend.attached_handlers(), 0);
    assert_eq!(
        reporter.events().last(),
        Some(&LifecycleEvent::WorkerStopped)
    );
}

#[rstest]
#[tokio::test]
async fn end_of_input_after_shutdown_does_not_disconnect_again() {
    let backend = FakeBackend::new().authorized_as(user());
    let (worker, mut parent) = spawn_worker(&backend, reporter());

    let driver = async move {
        parent.send("u", "start_updates", json!({})).await;
        parent.send("x", "shutdown", json!({})).await;
        parent.next_response().await;
        let shutdown = parent.next_response().await;
        parent.close().await;
        shutdown
    };
    let (result, shutdown) = tokio::join!(worker, driver);
    result.expect("worker exits cleanly");

    assert!(shutdown.ok);
    let disconnects = backend
        .calls()
        .into_iter()
        .filter(|call| *call == "disconnect")
        .count();
    assert_eq!(disconnects, 1);
}

#[rstest]
#[tokio::test]
async fn event_bursts_keep_the_most_recent_events() {
    let backend = FakeBackend::new().authorized_as(user());
    let reporter = reporter();
    let (worker, mut parent) = spawn_worker(&backend, reporter.clone());
    let producer = backend.clone();

    let driver = async move {
        parent.send("u", "start_updates", json!({})).await;
        parent.next_response().await;
        for id in 1..=250 {
            producer.emit_message(message(id, 3, "burst"));
        }
        let mut ids = Vec::new();
        for _ in 0..EVENT_QUEUE_CAPACITY {
            let envelope = parent
                .next_output()
                .await
                .into_event()
                .expect("only events are pending");
            ids.push(envelope.event.message.id);
        }
        (ids, parent.close().await)
    };
    let (result, (ids, rest)) = tokio::join!(worker, driver);
    result.expect("worker exits cleanly");

    let expected: Vec<i64> = (51..=250).collect();
    assert_eq!(ids, expected);
    assert!(rest.is_empty());
    assert!(
        reporter
            .events()
            .contains(&LifecycleEvent::EventsDropped {
                newly: 50,
                total: 50
            })
    );
}

/// Writer whose first `failures` writes fail.
#[derive(Default)]
struct FlakyWriter {
    failures: usize,
    written: Vec<u8>,
}

impl AsyncWrite for FlakyWriter {
    fn poll_write(
        mut self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        if self.failures > 0 {
            self.failures -= 1;
            return Poll::Ready(Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "parent went away",
            )));
        }
        self.written.extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

fn event(id: i64) -> Event {
    Event {
        kind: EventKind::Message,
        message: message_view(message(id, 1, "hello")),
    }
}

#[rstest]
#[tokio::test]
async fn event_writer_survives_write_failures() {
    let queue = Arc::new(EventQueue::new());
    let sink = LineSink::new(FlakyWriter {
        failures: 1,
        written: Vec::new(),
    });
    let mut writer = EventWriter::new(Arc::clone(&queue), sink.clone(), reporter());
    queue.push(event(1));
    queue.push(event(2));

    writer.write_next().await;
    writer.write_next().await;

    let output = sink
        .with_writer(|flaky| String::from_utf8(flaky.written.clone()))
        .await
        .expect("utf8");
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 1);
    let envelope = OutputLine::parse(lines[0])
        .expect("decode")
        .into_event()
        .expect("event line");
    assert_eq!(envelope.event.message.id, 2);
}

#[rstest]
#[tokio::test]
async fn event_writer_reports_overflow_once() {
    let queue = Arc::new(EventQueue::with_capacity(2));
    let reporter = reporter();
    let sink = LineSink::new(Vec::new());
    let mut writer = EventWriter::new(Arc::clone(&queue), sink, reporter.clone());
    for id in 1..=3 {
        queue.push(event(id));
    }

    writer.write_next().await;
    writer.write_next().await;

    assert_eq!(
        reporter.events(),
        vec![LifecycleEvent::EventsDropped { newly: 1, total: 1 }]
    );
}
