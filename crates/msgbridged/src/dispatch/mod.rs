//! Command dispatch for the worker's request loop.
//!
//! Each request is validated into a typed [`Command`] before anything
//! touches the external client, then executed against the shared
//! [`WorkerState`]. Every request produces exactly one [`Response`].
//!
//! [`Response`]: msgbridge_protocol::Response

mod command;
mod dispatcher;
mod errors;
mod state;

pub use command::{ButtonAction, Command};
pub use dispatcher::CommandDispatcher;
pub use errors::DispatchError;
pub use state::WorkerState;

/// Tracing target for dispatch operations.
pub(crate) const DISPATCH_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::dispatch");
