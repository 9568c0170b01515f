//! Client used when no messaging backend is linked into the binary.
//!
//! The detached client reports an unauthorised session, never delivers
//! notifications and fails every remote operation with
//! [`ClientError::Unavailable`].

use async_trait::async_trait;

use msgbridge_config::ApiCredentials;

use super::{
    ClientConnector, ClientError, Dialog, ExternalClient, NotificationHandler, SignIn,
    Subscription,
};
use crate::auth::UserIdentity;

const CLIENT_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::client::detached");

/// Connector producing [`DetachedClient`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedConnector;

#[async_trait(?Send)]
impl ClientConnector for DetachedConnector {
    async fn connect(
        &self,
        credentials: &ApiCredentials,
    ) -> Result<Box<dyn ExternalClient>, ClientError> {
        tracing::warn!(
            target: CLIENT_TARGET,
            api_id = credentials.api_id,
            session = %credentials.session_path,
            "no messaging backend linked; commands needing the network will fail"
        );
        Ok(Box::new(DetachedClient))
    }
}

/// Client without a remote connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetachedClient;

impl DetachedClient {
    fn unavailable<T>(operation: &'static str) -> Result<T, ClientError> {
        tracing::warn!(
            target: CLIENT_TARGET,
            operation,
            "operation requested but no messaging backend is linked"
        );
        Err(ClientError::unavailable(operation))
    }
}

#[async_trait(?Send)]
impl ExternalClient for DetachedClient {
    async fn is_authorized(&self) -> Result<bool, ClientError> {
        Ok(false)
    }

    async fn start(&self) -> Result<(), ClientError> {
        Ok(())
    }

    async fn current_user(&self) -> Result<UserIdentity, ClientError> {
        Self::unavailable("current_user")
    }

    async fn request_login_code(&self, _phone: &str) -> Result<(), ClientError> {
        Self::unavailable("request_login_code")
    }

    async fn sign_in(&self, _phone: &str, _code: &str) -> Result<SignIn, ClientError> {
        Self::unavailable("sign_in")
    }

    async fn check_password(&self, _password: &str) -> Result<UserIdentity, ClientError> {
        Self::unavailable("check_password")
    }

    async fn dialogs(&self) -> Result<Vec<Dialog>, ClientError> {
        Self::unavailable("dialogs")
    }

    async fn send_message(&self, _chat_id: i64, _text: &str) -> Result<(), ClientError> {
        Self::unavailable("send_message")
    }

    async fn press_callback(
        &self,
        _chat_id: i64,
        _message_id: i64,
        _data: &[u8],
    ) -> Result<(), ClientError> {
        Self::unavailable("press_callback")
    }

    fn on_message(&self, _handler: NotificationHandler) -> Subscription {
        Subscription::inert()
    }

    fn on_message_edited(&self, _handler: NotificationHandler) -> Subscription {
        Subscription::inert()
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        Ok(())
    }
}
