//! Typed payload objects carried inside responses.

use serde::{Deserialize, Serialize};

/// Snapshot of the login flow, tagged by `state`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum AuthSnapshot {
    /// No phone number has been submitted yet.
    WaitingPhoneNumber,
    /// A login code was requested for the phone number.
    WaitingCode {
        /// Phone number awaiting its code.
        phone_number: String,
    },
    /// The account requires its second-factor password.
    WaitingPassword {
        /// Hint configured for the password, possibly empty.
        password_hint: String,
    },
    /// Login finished.
    Ready {
        /// Identifier of the authenticated user.
        user_id: i64,
        /// First name, empty when unset.
        first_name: String,
        /// Last name, empty when unset.
        last_name: String,
        /// Phone number, empty when hidden.
        phone: String,
    },
}

/// Payload of a `list_groups` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupsPayload {
    /// Group conversations visible to the user.
    pub groups: Vec<GroupView>,
}

/// One group conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupView {
    /// Conversation identifier.
    pub id: i64,
    /// Display title.
    pub title: String,
    /// Basic group or supergroup.
    pub group_type: GroupType,
}

/// Group flavour derived from the megagroup flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupType {
    /// Basic group.
    Group,
    /// Megagroup.
    Supergroup,
}

impl GroupType {
    /// Classifies a group from its megagroup flag.
    #[must_use]
    pub fn from_megagroup(megagroup: bool) -> Self {
        if megagroup { Self::Supergroup } else { Self::Group }
    }
}

/// Machine-readable codes for structured errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Account-wide rate limit.
    FloodWait,
    /// Per-conversation slow mode.
    SlowmodeWait,
    /// The session was invalidated remotely.
    AuthRevoked,
}

impl ErrorCode {
    /// Wire representation, also used as the response `error` string.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::FloodWait => "FLOOD_WAIT",
            Self::SlowmodeWait => "SLOWMODE_WAIT",
            Self::AuthRevoked => "AUTH_REVOKED",
        }
    }
}

/// Structured detail attached to a failed response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Error code, repeated from the response `error` field.
    pub code: ErrorCode,
    /// Seconds to wait before retrying, for wait errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seconds: Option<u64>,
    /// Remote explanation, for revocation errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ErrorDetail {
    /// Detail for a wait-style error.
    #[must_use]
    pub fn wait(code: ErrorCode, seconds: u64) -> Self {
        Self {
            code,
            seconds: Some(seconds),
            message: None,
        }
    }

    /// Detail for an error explained by a message.
    pub fn explained(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            seconds: None,
            message: Some(message.into()),
        }
    }
}
