//! Conversion of client messages into wire events.

use std::sync::Arc;

use msgbridge_protocol::{ButtonKind, ButtonView, Event, EventKind, MessageView};

use super::EventQueue;
use crate::client::{IncomingMessage, NotificationHandler, RawButton};

/// Classifies a keyboard button.
///
/// Callback data wins over a URL; a button with neither is a plain text
/// button. Callback data is rendered as lowercase hex.
#[must_use]
pub fn classify_button(button: &RawButton) -> ButtonView {
    if let Some(data) = &button.data {
        return ButtonView {
            text: button.text.clone(),
            kind: ButtonKind::Callback,
            data: Some(hex::encode(data)),
            url: None,
        };
    }
    match button.url.as_deref() {
        Some(url) if !url.is_empty() => ButtonView {
            text: button.text.clone(),
            kind: ButtonKind::Url,
            data: None,
            url: Some(url.to_owned()),
        },
        _ => ButtonView {
            text: button.text.clone(),
            kind: ButtonKind::Text,
            data: None,
            url: None,
        },
    }
}

/// Flattens a client message into its wire view.
#[must_use]
pub fn message_view(message: IncomingMessage) -> MessageView {
    MessageView {
        id: message.id,
        chat_id: message.chat_id,
        sender_id: message.sender_id.unwrap_or_default(),
        text: message.text.unwrap_or_default(),
        is_outgoing: message.outgoing,
        buttons: message
            .buttons
            .iter()
            .map(|row| row.iter().map(classify_button).collect())
            .collect(),
    }
}

/// Builds a notification handler that enqueues events of `kind`.
///
/// The handler only converts and enqueues; writing happens in the
/// [`EventWriter`](super::EventWriter).
#[must_use]
pub fn enqueue_handler(queue: Arc<EventQueue>, kind: EventKind) -> NotificationHandler {
    Arc::new(move |message: IncomingMessage| {
        queue.push(Event {
            kind,
            message: message_view(message),
        });
    })
}
