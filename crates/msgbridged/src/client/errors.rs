//! Errors reported by the external client.

use std::error::Error as StdError;

use thiserror::Error;

/// Failures raised by [`ExternalClient`](super::ExternalClient) operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The account is rate limited.
    #[error("rate limited for {seconds} seconds")]
    FloodWait {
        /// Seconds to wait before retrying.
        seconds: u64,
    },
    /// The conversation is in slow mode.
    #[error("slow mode active for {seconds} seconds")]
    SlowModeWait {
        /// Seconds to wait before posting again.
        seconds: u64,
    },
    /// The session was invalidated remotely.
    #[error("session revoked: {message}")]
    AuthRevoked {
        /// Remote explanation.
        message: String,
    },
    /// The remote side rejected the request.
    #[error("{message}")]
    Rejected {
        /// Remote explanation.
        message: String,
    },
    /// No messaging backend is available for the operation.
    #[error("{operation} is unavailable: no messaging backend is linked")]
    Unavailable {
        /// Operation that was attempted.
        operation: &'static str,
    },
    /// The connection to the remote service failed.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the failure.
        message: String,
        /// Underlying error, when available.
        #[source]
        source: Option<Box<dyn StdError + Send + Sync>>,
    },
}

impl ClientError {
    /// Creates a rate-limit error.
    #[must_use]
    pub fn flood_wait(seconds: u64) -> Self {
        Self::FloodWait { seconds }
    }

    /// Creates a slow-mode error.
    #[must_use]
    pub fn slow_mode(seconds: u64) -> Self {
        Self::SlowModeWait { seconds }
    }

    /// Creates a revoked-session error.
    pub fn auth_revoked(message: impl Into<String>) -> Self {
        Self::AuthRevoked {
            message: message.into(),
        }
    }

    /// Creates a rejection error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates an unavailable-operation error.
    #[must_use]
    pub fn unavailable(operation: &'static str) -> Self {
        Self::Unavailable { operation }
    }

    /// Creates a transport error without an underlying cause.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
            source: None,
        }
    }

    /// Creates a transport error wrapping its cause.
    pub fn transport_with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Transport {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}
