//! Wire types for the msgbridge line protocol.
//!
//! Every line on the worker's stdin is a [`Request`]. Every line on its
//! stdout is either a [`Response`] correlated to a request by `id`, or an
//! [`EventEnvelope`] carrying a push notification. Parents that read the
//! stream can decode a line without knowing which kind it is through
//! [`OutputLine::parse`].
//!
//! ```json
//! {"id":"7","command":"send_phone","payload":{"phone":"+15550100"}}
//! {"id":"7","ok":true,"payload":{"state":"waiting_code","phone_number":"+15550100"}}
//! {"event":{"type":"message","message":{"id":1,"chat_id":-100,"sender_id":0,"text":"hi","is_outgoing":false,"buttons":[]}}}
//! ```

mod event;
mod output;
mod payloads;
mod request;
mod response;

pub use event::{ButtonKind, ButtonView, Event, EventEnvelope, EventKind, MessageView};
pub use output::OutputLine;
pub use payloads::{AuthSnapshot, ErrorCode, ErrorDetail, GroupType, GroupView, GroupsPayload};
pub use request::Request;
pub use response::Response;
