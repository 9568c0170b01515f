//! Request envelope read from the worker's stdin.

use serde::de::{self, Unexpected};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// One command sent by the parent process.
///
/// Only JSON objects decode as envelopes. Fields are read leniently so that
/// every decoded envelope can be answered:
///
/// - `id` is echoed verbatim; a missing or `null` id becomes the empty
///   string and any other JSON value is rendered as its text.
/// - `command` is `None` when missing or `null`; a non-string command keeps
///   its JSON text so it is reported as an unknown command.
/// - `payload` defaults to an empty object when missing or `null`; other
///   values are kept as they are and rejected by commands that read them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    /// Caller-supplied correlation identifier.
    pub id: String,
    /// Command name such as `send_phone` or `list_groups`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
    /// Command arguments, normally an object.
    pub payload: Value,
}

impl Request {
    /// Builds a request with the given payload.
    pub fn new(
        id: impl Into<String>,
        command: impl Into<String>,
        payload: Map<String, Value>,
    ) -> Self {
        Self {
            id: id.into(),
            command: Some(command.into()),
            payload: Value::Object(payload),
        }
    }

    /// Parses one input line.
    ///
    /// Trailing whitespace and the newline delimiter are ignored.
    ///
    /// # Errors
    ///
    /// Returns the `serde_json` error when the line is not valid JSON or is
    /// not a JSON object.
    pub fn parse(line: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(line.trim_end())
    }

    /// Command name, or the empty string when absent.
    #[must_use]
    pub fn command(&self) -> &str {
        self.command.as_deref().unwrap_or_default()
    }

    fn from_fields(mut fields: Map<String, Value>) -> Self {
        let id = match fields.remove("id") {
            None | Some(Value::Null) => String::new(),
            Some(value) => value_text(value),
        };
        let command = match fields.remove("command") {
            None | Some(Value::Null) => None,
            Some(value) => Some(value_text(value)),
        };
        let payload = match fields.remove("payload") {
            None | Some(Value::Null) => Value::Object(Map::new()),
            Some(value) => value,
        };
        Self {
            id,
            command,
            payload,
        }
    }
}

impl<'de> Deserialize<'de> for Request {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::Object(fields) => Ok(Self::from_fields(fields)),
            other => Err(de::Error::invalid_type(
                unexpected(&other),
                &"a request object",
            )),
        }
    }
}

fn unexpected(value: &Value) -> Unexpected<'_> {
    match value {
        Value::Null => Unexpected::Unit,
        Value::Bool(flag) => Unexpected::Bool(*flag),
        Value::Number(_) => Unexpected::Other("number"),
        Value::String(text) => Unexpected::Str(text),
        Value::Array(_) => Unexpected::Seq,
        Value::Object(_) => Unexpected::Map,
    }
}

/// Strings as they are, anything else as compact JSON.
fn value_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => other.to_string(),
    }
}
