//! Login flow state machine.
//!
//! The flow only ever moves forward:
//! `WaitingPhoneNumber -> WaitingCode -> [WaitingPassword] -> Ready`.
//! Re-submitting a phone number while a code is pending restarts the code
//! step with the new number. Lazy client creation may jump straight to
//! `Ready` when the persisted session is already authorised.

use msgbridge_protocol::AuthSnapshot;
use thiserror::Error;

/// Identity of the authenticated account.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserIdentity {
    /// Account identifier.
    pub id: i64,
    /// First name, empty when unset.
    pub first_name: String,
    /// Last name, empty when unset.
    pub last_name: String,
    /// Phone number, empty when hidden.
    pub phone: String,
}

impl UserIdentity {
    /// Builds an identity with only the identifier set.
    #[must_use]
    pub fn with_id(id: i64) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Current position in the login flow.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing submitted yet.
    #[default]
    WaitingPhoneNumber,
    /// A login code was sent to `phone`.
    WaitingCode {
        /// Number the code was sent to.
        phone: String,
    },
    /// The code was accepted and the account needs its password.
    WaitingPassword {
        /// Number the login started with.
        phone: String,
        /// Password hint, possibly empty.
        hint: String,
    },
    /// Signed in.
    Ready {
        /// Authenticated account.
        user: UserIdentity,
    },
}

/// A command that does not fit the current login step.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
pub enum AuthTransitionError {
    /// The session is already signed in.
    #[error("Already authorized")]
    AlreadyAuthorized,
    /// The code was accepted and only the password step remains.
    #[error("Password required to finish sign-in")]
    PasswordPending,
    /// No login code has been requested yet.
    #[error("Code and phone required")]
    PhoneMissing,
    /// No password step is pending.
    #[error("No password step pending")]
    NoPasswordPending,
}

impl AuthState {
    /// Serializable view used by the `state` command and login replies.
    #[must_use]
    pub fn snapshot(&self) -> AuthSnapshot {
        match self {
            Self::WaitingPhoneNumber => AuthSnapshot::WaitingPhoneNumber,
            Self::WaitingCode { phone } => AuthSnapshot::WaitingCode {
                phone_number: phone.clone(),
            },
            Self::WaitingPassword { hint, .. } => AuthSnapshot::WaitingPassword {
                password_hint: hint.clone(),
            },
            Self::Ready { user } => AuthSnapshot::Ready {
                user_id: user.id,
                first_name: user.first_name.clone(),
                last_name: user.last_name.clone(),
                phone: user.phone.clone(),
            },
        }
    }

    /// Whether the login flow has completed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }

    /// The signed-in account, once ready.
    #[must_use]
    pub fn user(&self) -> Option<&UserIdentity> {
        match self {
            Self::Ready { user } => Some(user),
            _ => None,
        }
    }

    /// Checks that a login code may be requested.
    ///
    /// # Errors
    ///
    /// Fails once the code has been accepted.
    pub fn ensure_can_request_code(&self) -> Result<(), AuthTransitionError> {
        match self {
            Self::WaitingPhoneNumber | Self::WaitingCode { .. } => Ok(()),
            Self::WaitingPassword { .. } => Err(AuthTransitionError::PasswordPending),
            Self::Ready { .. } => Err(AuthTransitionError::AlreadyAuthorized),
        }
    }

    /// Phone number a submitted code belongs to.
    ///
    /// # Errors
    ///
    /// Fails when no code was requested or the session is signed in.
    pub fn pending_phone(&self) -> Result<&str, AuthTransitionError> {
        match self {
            Self::WaitingCode { phone } | Self::WaitingPassword { phone, .. } => Ok(phone),
            Self::WaitingPhoneNumber => Err(AuthTransitionError::PhoneMissing),
            Self::Ready { .. } => Err(AuthTransitionError::AlreadyAuthorized),
        }
    }

    /// Checks that the password step is pending.
    ///
    /// # Errors
    ///
    /// Fails in every state other than `WaitingPassword`.
    pub fn ensure_awaiting_password(&self) -> Result<(), AuthTransitionError> {
        match self {
            Self::WaitingPassword { .. } => Ok(()),
            Self::Ready { .. } => Err(AuthTransitionError::AlreadyAuthorized),
            Self::WaitingPhoneNumber | Self::WaitingCode { .. } => {
                Err(AuthTransitionError::NoPasswordPending)
            }
        }
    }

    /// Records that a login code was sent to `phone`.
    ///
    /// # Errors
    ///
    /// Fails when the flow is already past the code request.
    pub fn code_requested(&mut self, phone: String) -> Result<(), AuthTransitionError> {
        self.ensure_can_request_code()?;
        *self = Self::WaitingCode { phone };
        Ok(())
    }

    /// Records that the accepted code must be followed by a password.
    ///
    /// # Errors
    ///
    /// Fails unless a code was pending.
    pub fn password_required(&mut self, hint: String) -> Result<(), AuthTransitionError> {
        let phone = self.pending_phone()?.to_owned();
        *self = Self::WaitingPassword { phone, hint };
        Ok(())
    }

    /// Records a completed sign-in.
    ///
    /// # Errors
    ///
    /// Fails when the session is already signed in.
    pub fn authorized(&mut self, user: UserIdentity) -> Result<(), AuthTransitionError> {
        if self.is_ready() {
            return Err(AuthTransitionError::AlreadyAuthorized);
        }
        *self = Self::Ready { user };
        Ok(())
    }
}
