//! Push notification pipeline.
//!
//! Client callbacks convert each message into a wire [`Event`] and push it
//! onto the bounded [`EventQueue`]; the [`EventWriter`] drains the queue to
//! stdout alongside command responses.
//!
//! [`Event`]: msgbridge_protocol::Event

mod convert;
mod queue;
mod writer;

pub use convert::{classify_button, enqueue_handler, message_view};
pub use queue::{EVENT_QUEUE_CAPACITY, EventQueue};
pub use writer::EventWriter;
