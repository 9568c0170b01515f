//! Stdio worker bridging a parent process to an asynchronous messaging
//! client.
//!
//! The parent writes one JSON request per line to stdin and reads one JSON
//! response per request from stdout. Push notifications from the client
//! (new and edited messages) are written to the same stream as
//! `{"event": ...}` lines, interleaved with responses at line granularity.
//!
//! The worker owns the login flow ([`AuthState`]): phone number, login code
//! and, when the account has one, a second-factor password. The messaging
//! client is created lazily through a [`ClientConnector`] the first time a
//! command needs it. Notifications are buffered in a bounded
//! [`EventQueue`] that drops the oldest events on overflow so a slow parent
//! can never stall the client.
//!
//! Diagnostics are written to stderr through `tracing`; stdout carries the
//! protocol only.

mod auth;
mod bootstrap;
pub mod client;
mod dispatch;
mod events;
mod lifecycle;
pub mod telemetry;
mod transport;
mod worker;

pub use auth::{AuthState, AuthTransitionError, UserIdentity};
pub use bootstrap::{
    BootstrapError, ConfigLoader, StaticConfigLoader, SystemConfigLoader, Worker, bootstrap_with,
};
pub use client::{ClientConnector, ClientError, DetachedConnector, ExternalClient};
pub use dispatch::{ButtonAction, Command, CommandDispatcher, DispatchError, WorkerState};
pub use events::{EVENT_QUEUE_CAPACITY, EventQueue, EventWriter, classify_button, message_view};
pub use lifecycle::{LifecycleReporter, StructuredLifecycleReporter};
pub use telemetry::{TelemetryError, TelemetryHandle};
pub use transport::{LineReader, LineSink, MAX_REQUEST_BYTES, TransportError};
pub use worker::run_worker;

#[cfg(test)]
mod tests;
