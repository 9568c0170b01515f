//! Push notifications forwarded to the parent as out-of-band lines.

use serde::{Deserialize, Serialize};

/// Outer wrapper that distinguishes event lines from responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope {
    /// The notification itself.
    pub event: Event,
}

impl From<Event> for EventEnvelope {
    fn from(event: Event) -> Self {
        Self { event }
    }
}

/// A single push notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Notification kind.
    #[serde(rename = "type")]
    pub kind: EventKind,
    /// Message the notification refers to.
    pub message: MessageView,
}

/// Kinds of push notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// A new message arrived.
    Message,
    /// An existing message was edited.
    MessageEdited,
}

/// Flattened view of a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageView {
    /// Message identifier, unique within its chat.
    pub id: i64,
    /// Conversation identifier.
    pub chat_id: i64,
    /// Sender identifier, `0` when the sender is unknown.
    pub sender_id: i64,
    /// Raw message text, empty for media-only messages.
    pub text: String,
    /// Whether the current user sent the message.
    pub is_outgoing: bool,
    /// Keyboard attached to the message, row by row.
    pub buttons: Vec<Vec<ButtonView>>,
}

/// One keyboard button.
///
/// `data` and `url` are always present on the wire and `null` when they do
/// not apply to the button kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ButtonView {
    /// Button label.
    pub text: String,
    /// Classified button kind.
    #[serde(rename = "type")]
    pub kind: ButtonKind,
    /// Callback payload as lowercase hex, for callback buttons.
    pub data: Option<String>,
    /// Target URL, for link buttons.
    pub url: Option<String>,
}

/// Button classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ButtonKind {
    /// Inline button carrying callback data.
    Callback,
    /// Inline button opening a URL.
    Url,
    /// Reply-keyboard button that sends its label as text.
    Text,
    /// Button the worker could not classify.
    Unknown,
}
