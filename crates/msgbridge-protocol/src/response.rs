//! Response envelope written to the worker's stdout.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Terminal reply to exactly one [`Request`](crate::Request).
///
/// `ok` discriminates success from failure. Successful responses always
/// carry a payload object; failures carry an `error` string and, for
/// structured errors, a payload with machine-readable detail. Absent fields
/// are omitted from the serialized line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Identifier echoed from the request.
    pub id: String,
    /// Whether the command succeeded.
    pub ok: bool,
    /// Result object, or structured error detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    /// Error message or code when `ok` is false.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Response {
    /// Builds a success response with an empty payload object.
    pub fn empty(id: impl Into<String>) -> Self {
        Self::success(id, Value::Object(Map::new()))
    }

    /// Builds a success response.
    pub fn success(id: impl Into<String>, payload: Value) -> Self {
        Self {
            id: id.into(),
            ok: true,
            payload: Some(payload),
            error: None,
        }
    }

    /// Builds a failure response without detail.
    pub fn failure(id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ok: false,
            payload: None,
            error: Some(error.into()),
        }
    }

    /// Builds a failure response carrying structured detail.
    pub fn failure_with_payload(
        id: impl Into<String>,
        error: impl Into<String>,
        payload: Value,
    ) -> Self {
        Self {
            id: id.into(),
            ok: false,
            payload: Some(payload),
            error: Some(error.into()),
        }
    }

    /// Looks up a field of the payload object.
    #[must_use]
    pub fn payload_field(&self, key: &str) -> Option<&Value> {
        self.payload.as_ref().and_then(|payload| payload.get(key))
    }
}
