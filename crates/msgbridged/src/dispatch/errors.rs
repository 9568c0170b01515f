//! Error types for command dispatch failures.
//!
//! Every variant maps onto a failed response. Rate limits and session
//! revocation become structured errors with a machine-readable code and
//! detail payload; everything else is reported by its message alone.

use msgbridge_protocol::{ErrorCode, ErrorDetail, Response};
use thiserror::Error;

use crate::auth::AuthTransitionError;
use crate::client::ClientError;

/// Errors surfaced while validating or executing a command.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The payload is missing a field or a field is malformed.
    #[error("{message}")]
    InvalidPayload { message: String },

    /// The command name is not recognised.
    #[error("Unknown command: {command}")]
    UnknownCommand { command: String },

    /// The command does not fit the current login step.
    #[error(transparent)]
    InvalidState(#[from] AuthTransitionError),

    /// The account is rate limited.
    #[error("rate limited for {seconds} seconds")]
    RateLimited { seconds: u64 },

    /// The conversation is in slow mode.
    #[error("slow mode active for {seconds} seconds")]
    SlowMode { seconds: u64 },

    /// The session was invalidated remotely.
    #[error("session revoked: {message}")]
    AuthRevoked { message: String },

    /// Any other client failure.
    #[error(transparent)]
    Client(ClientError),

    /// Response serialization failed.
    #[error("failed to serialize response: {0}")]
    SerializeResponse(#[from] serde_json::Error),
}

impl From<ClientError> for DispatchError {
    fn from(error: ClientError) -> Self {
        match error {
            ClientError::FloodWait { seconds } => Self::RateLimited { seconds },
            ClientError::SlowModeWait { seconds } => Self::SlowMode { seconds },
            ClientError::AuthRevoked { message } => Self::AuthRevoked { message },
            other => Self::Client(other),
        }
    }
}

impl DispatchError {
    /// Creates an invalid payload error.
    pub fn invalid_payload(message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            message: message.into(),
        }
    }

    /// Creates an unknown command error.
    pub fn unknown_command(command: impl Into<String>) -> Self {
        Self::UnknownCommand {
            command: command.into(),
        }
    }

    /// Machine-readable code for structured errors.
    #[must_use]
    pub fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::RateLimited { .. } => Some(ErrorCode::FloodWait),
            Self::SlowMode { .. } => Some(ErrorCode::SlowmodeWait),
            Self::AuthRevoked { .. } => Some(ErrorCode::AuthRevoked),
            _ => None,
        }
    }

    /// Whether the error was caught before any external call.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidPayload { .. } | Self::UnknownCommand { .. } | Self::InvalidState(_)
        )
    }

    /// Converts the error into the failed response for request `id`.
    #[must_use]
    pub fn to_response(&self, id: &str) -> Response {
        let detail = match self {
            Self::RateLimited { seconds } => ErrorDetail::wait(ErrorCode::FloodWait, *seconds),
            Self::SlowMode { seconds } => ErrorDetail::wait(ErrorCode::SlowmodeWait, *seconds),
            Self::AuthRevoked { message } => {
                ErrorDetail::explained(ErrorCode::AuthRevoked, message.clone())
            }
            _ => return Response::failure(id, self.to_string()),
        };
        match serde_json::to_value(&detail) {
            Ok(payload) => Response::failure_with_payload(id, detail.code.as_str(), payload),
            Err(_) => Response::failure(id, detail.code.as_str()),
        }
    }
}
