//! Seam between the worker and the external messaging client.
//!
//! The dispatcher only talks to [`ExternalClient`]; the concrete client is
//! produced by a [`ClientConnector`] the first time a command needs it.

mod detached;
mod errors;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use msgbridge_config::ApiCredentials;

use crate::auth::UserIdentity;

pub use detached::{DetachedClient, DetachedConnector};
pub use errors::ClientError;

/// Callback invoked for every incoming notification.
///
/// Handlers may be called from any thread and must not block.
pub type NotificationHandler = Arc<dyn Fn(IncomingMessage) + Send + Sync>;

/// Outcome of submitting a login code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignIn {
    /// The code completed the login.
    Authorized(UserIdentity),
    /// The account has a second-factor password.
    PasswordRequired {
        /// Hint configured for the password, possibly empty.
        hint: String,
    },
}

/// Conversation returned by [`ExternalClient::dialogs`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dialog {
    /// Conversation identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Whether the conversation is a group of any kind.
    pub is_group: bool,
    /// Whether the group is a megagroup.
    pub megagroup: bool,
}

/// Message as delivered by the client, before classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Message identifier.
    pub id: i64,
    /// Conversation identifier.
    pub chat_id: i64,
    /// Sender, when known.
    pub sender_id: Option<i64>,
    /// Text, absent for media-only messages.
    pub text: Option<String>,
    /// Whether the current user sent it.
    pub outgoing: bool,
    /// Attached keyboard rows.
    pub buttons: Vec<Vec<RawButton>>,
}

/// Keyboard button as delivered by the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawButton {
    /// Label.
    pub text: String,
    /// Callback payload, present on callback buttons.
    pub data: Option<Vec<u8>>,
    /// Link target, present on URL buttons.
    pub url: Option<String>,
}

/// Handle returned when a notification handler is registered.
///
/// Dropping the handle leaves the handler attached; call
/// [`Subscription::dispose`] to detach it.
pub struct Subscription {
    dispose: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    /// Wraps the action that detaches the handler.
    pub fn new(dispose: impl FnOnce() + 'static) -> Self {
        Self {
            dispose: Some(Box::new(dispose)),
        }
    }

    /// A subscription with nothing to detach.
    #[must_use]
    pub fn inert() -> Self {
        Self { dispose: None }
    }

    /// Detaches the handler.
    pub fn dispose(mut self) {
        if let Some(dispose) = self.dispose.take() {
            dispose();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("Subscription")
            .field("attached", &self.dispose.is_some())
            .finish()
    }
}

/// Operations the worker needs from a messaging client.
///
/// The worker drives one client from a single task, so implementations do
/// not need to be `Send`. Remote failures are reported as [`ClientError`]
/// and classified by the dispatcher.
#[async_trait(?Send)]
pub trait ExternalClient {
    /// Whether the persisted session is already signed in.
    async fn is_authorized(&self) -> Result<bool, ClientError>;

    /// Finishes start-up for an authorised session.
    async fn start(&self) -> Result<(), ClientError>;

    /// Identity of the signed-in account.
    async fn current_user(&self) -> Result<UserIdentity, ClientError>;

    /// Sends a login code to `phone`.
    async fn request_login_code(&self, phone: &str) -> Result<(), ClientError>;

    /// Submits the login code received on `phone`.
    async fn sign_in(&self, phone: &str, code: &str) -> Result<SignIn, ClientError>;

    /// Submits the second-factor password and returns the signed-in account.
    async fn check_password(&self, password: &str) -> Result<UserIdentity, ClientError>;

    /// Lists the user's conversations.
    async fn dialogs(&self) -> Result<Vec<Dialog>, ClientError>;

    /// Sends a text message.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ClientError>;

    /// Presses an inline callback button on a message.
    async fn press_callback(
        &self,
        chat_id: i64,
        message_id: i64,
        data: &[u8],
    ) -> Result<(), ClientError>;

    /// Registers a handler for new messages.
    fn on_message(&self, handler: NotificationHandler) -> Subscription;

    /// Registers a handler for edited messages.
    fn on_message_edited(&self, handler: NotificationHandler) -> Subscription;

    /// Closes the connection.
    async fn disconnect(&self) -> Result<(), ClientError>;
}

/// Factory for connected clients.
#[async_trait(?Send)]
pub trait ClientConnector {
    /// Connects a client bound to the persisted session.
    async fn connect(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<Box<dyn ExternalClient>, ClientError>;
}
