//! Decoding of worker output lines on the parent side.

use serde::Deserialize;

use crate::{EventEnvelope, Response};

/// One line written by the worker.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OutputLine {
    /// Push notification, not correlated to a request.
    Event(EventEnvelope),
    /// Reply to a request.
    Response(Response),
}

impl OutputLine {
    /// Decodes a single output line.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the line is neither a response nor
    /// an event envelope.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }

    /// Returns the response, if this line is one.
    #[must_use]
    pub fn into_response(self) -> Option<Response> {
        match self {
            Self::Response(response) => Some(response),
            Self::Event(_) => None,
        }
    }

    /// Returns the event envelope, if this line is one.
    #[must_use]
    pub fn into_event(self) -> Option<EventEnvelope> {
        match self {
            Self::Event(envelope) => Some(envelope),
            Self::Response(_) => None,
        }
    }
}
