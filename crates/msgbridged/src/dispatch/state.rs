//! State owned by the dispatch loop.

use std::sync::Arc;

use tracing::{debug, warn};

use msgbridge_config::ApiCredentials;
use msgbridge_protocol::EventKind;

use super::DISPATCH_TARGET;
use super::errors::DispatchError;
use crate::auth::{AuthState, UserIdentity};
use crate::client::{ClientConnector, ClientError, ExternalClient, Subscription};
use crate::events::{EventQueue, enqueue_handler};
use crate::lifecycle::LifecycleReporter;

/// Everything the dispatcher mutates while serving commands.
///
/// The client is created on first need and kept for the rest of the
/// process, even after it has been disconnected.
#[derive(Debug)]
pub struct WorkerState {
    credentials: ApiCredentials,
    auth: AuthState,
    session: Option<ClientSession>,
}

struct ClientSession {
    client: Box<dyn ExternalClient>,
    subscriptions: Vec<Subscription>,
    connected: bool,
}

impl std::fmt::Debug for ClientSession {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("ClientSession")
            .field("subscriptions", &self.subscriptions.len())
            .field("connected", &self.connected)
            .finish_non_exhaustive()
    }
}

impl WorkerState {
    /// Creates the state for a fresh worker.
    #[must_use]
    pub fn new(credentials: ApiCredentials) -> Self {
        Self {
            credentials,
            auth: AuthState::default(),
            session: None,
        }
    }

    /// Credentials the client is created with.
    #[must_use]
    pub fn credentials(&self) -> &ApiCredentials {
        &self.credentials
    }

    /// Current login step.
    #[must_use]
    pub fn auth(&self) -> &AuthState {
        &self.auth
    }

    /// Whether the client has been created.
    #[must_use]
    pub fn has_client(&self) -> bool {
        self.session.is_some()
    }

    /// Whether the client exists and has not been disconnected.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.session.as_ref().is_some_and(|session| session.connected)
    }

    /// Returns the client, creating it first if needed, alongside the login
    /// state so both can be used while a command runs.
    pub(super) async fn client<C>(
        &mut self,
        connector: &C,
        queue: &Arc<EventQueue>,
        reporter: &dyn LifecycleReporter,
    ) -> Result<(&dyn ExternalClient, &mut AuthState), DispatchError>
    where
        C: ClientConnector,
    {
        let session = match self.session.take() {
            Some(session) => session,
            None => {
                ClientSession::open(connector, &self.credentials, queue, reporter, &mut self.auth)
                    .await?
            }
        };
        let session = self.session.insert(session);
        Ok((session.client.as_ref(), &mut self.auth))
    }

    /// Detaches handlers and disconnects the client, if one exists.
    pub async fn close(&mut self) {
        if let Some(session) = self.session.as_mut() {
            session.close().await;
        }
    }
}

impl ClientSession {
    async fn open<C>(
        connector: &C,
        credentials: &ApiCredentials,
        queue: &Arc<EventQueue>,
        reporter: &dyn LifecycleReporter,
        auth: &mut AuthState,
    ) -> Result<Self, DispatchError>
    where
        C: ClientConnector,
    {
        reporter.client_connecting();
        let client = match connector.connect(credentials).await {
            Ok(client) => client,
            Err(error) => {
                reporter.client_failed(&error);
                return Err(error.into());
            }
        };

        let (subscriptions, user) = match prepare(client.as_ref(), queue).await {
            Ok(prepared) => prepared,
            Err(error) => {
                reporter.client_failed(&error);
                if let Err(disconnect_error) = client.disconnect().await {
                    warn!(
                        target: DISPATCH_TARGET,
                        error = %disconnect_error,
                        "failed to disconnect partially initialised client"
                    );
                }
                return Err(error.into());
            }
        };

        let authorized = user.is_some();
        if let Some(user) = user
            && let Err(error) = auth.authorized(user)
        {
            debug!(target: DISPATCH_TARGET, %error, "login state already complete");
        }
        reporter.client_ready(authorized);

        Ok(Self {
            client,
            subscriptions,
            connected: true,
        })
    }

    async fn close(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.dispose();
        }
        if !self.connected {
            return;
        }
        self.connected = false;
        if let Err(error) = self.client.disconnect().await {
            warn!(
                target: DISPATCH_TARGET,
                error = %error,
                "client disconnect failed"
            );
        }
    }
}

/// Runs the start-up sequence on a freshly connected client.
///
/// An authorised session is started, both notification handlers are
/// subscribed, and the signed-in user is fetched last.
async fn prepare(
    client: &dyn ExternalClient,
    queue: &Arc<EventQueue>,
) -> Result<(Vec<Subscription>, Option<UserIdentity>), ClientError> {
    let authorized = client.is_authorized().await?;
    if authorized {
        client.start().await?;
    }

    let subscriptions = vec![
        client.on_message(enqueue_handler(Arc::clone(queue), EventKind::Message)),
        client.on_message_edited(enqueue_handler(Arc::clone(queue), EventKind::MessageEdited)),
    ];
    if !authorized {
        return Ok((subscriptions, None));
    }

    match client.current_user().await {
        Ok(user) => Ok((subscriptions, Some(user))),
        Err(error) => {
            for subscription in subscriptions {
                subscription.dispose();
            }
            Err(error)
        }
    }
}
