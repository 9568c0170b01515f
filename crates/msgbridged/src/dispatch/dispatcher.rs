//! Execution of validated commands against the worker state.

use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value, json};
use tracing::{debug, error, warn};

use msgbridge_config::ApiCredentials;
use msgbridge_protocol::{GroupType, GroupView, GroupsPayload, Request, Response};

use super::DISPATCH_TARGET;
use super::command::{ButtonAction, Command};
use super::errors::DispatchError;
use super::state::WorkerState;
use crate::auth::AuthState;
use crate::client::{ClientConnector, ExternalClient, SignIn};
use crate::events::EventQueue;
use crate::lifecycle::LifecycleReporter;

/// Turns each request into exactly one response.
pub struct CommandDispatcher<C> {
    state: WorkerState,
    connector: C,
    queue: Arc<EventQueue>,
    reporter: Arc<dyn LifecycleReporter>,
}

impl<C> CommandDispatcher<C>
where
    C: ClientConnector,
{
    /// Creates a dispatcher that connects clients through `connector` and
    /// routes their notifications into `queue`.
    pub fn new(
        credentials: ApiCredentials,
        connector: C,
        queue: Arc<EventQueue>,
        reporter: Arc<dyn LifecycleReporter>,
    ) -> Self {
        Self {
            state: WorkerState::new(credentials),
            connector,
            queue,
            reporter,
        }
    }

    /// Read access to the worker state.
    pub fn state(&self) -> &WorkerState {
        &self.state
    }

    /// Handles one request.
    pub async fn dispatch(&mut self, request: &Request) -> Response {
        match self.handle(request).await {
            Ok(payload) => Response::success(request.id.clone(), payload),
            Err(failure) => {
                log_failure(request, &failure);
                failure.to_response(&request.id)
            }
        }
    }

    /// Detaches handlers and disconnects the client if it is still
    /// connected.
    pub async fn close(&mut self) {
        self.state.close().await;
    }

    async fn handle(&mut self, request: &Request) -> Result<Value, DispatchError> {
        let command = Command::parse(request.command.as_deref(), &request.payload)?;
        debug!(
            target: DISPATCH_TARGET,
            id = %request.id,
            command = command.name(),
            "dispatching command"
        );
        check_preconditions(self.state.auth(), &command)?;

        match command {
            Command::State => payload(self.state.auth().snapshot()),
            Command::Shutdown => {
                self.state.close().await;
                Ok(empty_payload())
            }
            command => {
                let (client, auth) = self
                    .state
                    .client(&self.connector, &self.queue, self.reporter.as_ref())
                    .await?;
                execute(command, client, auth).await
            }
        }
    }
}

/// Rejects login commands that do not fit the current step before any
/// external call is made.
fn check_preconditions(auth: &AuthState, command: &Command) -> Result<(), DispatchError> {
    match command {
        Command::SendPhone { .. } => auth.ensure_can_request_code()?,
        Command::SendCode { .. } => {
            auth.pending_phone()?;
        }
        Command::SendPassword { .. } => auth.ensure_awaiting_password()?,
        _ => {}
    }
    Ok(())
}

async fn execute(
    command: Command,
    client: &dyn ExternalClient,
    auth: &mut AuthState,
) -> Result<Value, DispatchError> {
    match command {
        Command::SendPhone { phone } => {
            // Client creation may have completed the login.
            auth.ensure_can_request_code()?;
            client.request_login_code(&phone).await?;
            auth.code_requested(phone)?;
            payload(auth.snapshot())
        }
        Command::SendCode { code } => {
            let phone = auth.pending_phone()?.to_owned();
            match client.sign_in(&phone, &code).await? {
                SignIn::Authorized(user) => auth.authorized(user)?,
                SignIn::PasswordRequired { hint } => auth.password_required(hint)?,
            }
            payload(auth.snapshot())
        }
        Command::SendPassword { password } => {
            auth.ensure_awaiting_password()?;
            let user = client.check_password(&password).await?;
            auth.authorized(user)?;
            payload(auth.snapshot())
        }
        Command::ListGroups => {
            let groups = client
                .dialogs()
                .await?
                .into_iter()
                .filter(|dialog| dialog.is_group)
                .map(|dialog| GroupView {
                    id: dialog.id,
                    title: dialog.name,
                    group_type: GroupType::from_megagroup(dialog.megagroup),
                })
                .collect();
            payload(GroupsPayload { groups })
        }
        Command::SendMessage { chat_id, text } => {
            client.send_message(chat_id, &text).await?;
            Ok(empty_payload())
        }
        Command::ClickButton {
            chat_id,
            message_id,
            action,
        } => {
            match action {
                ButtonAction::Callback(data) => {
                    client.press_callback(chat_id, message_id, &data).await?;
                }
                ButtonAction::Reply(text) => client.send_message(chat_id, &text).await?,
            }
            Ok(empty_payload())
        }
        Command::StartUpdates => Ok(json!({"status": "listening"})),
        Command::State | Command::Shutdown => Ok(empty_payload()),
    }
}

fn payload(value: impl Serialize) -> Result<Value, DispatchError> {
    Ok(serde_json::to_value(value)?)
}

fn empty_payload() -> Value {
    Value::Object(Map::new())
}

fn log_failure(request: &Request, failure: &DispatchError) {
    let command = request.command();
    if failure.is_validation() {
        debug!(
            target: DISPATCH_TARGET,
            id = %request.id,
            command,
            error = %failure,
            "command rejected"
        );
    } else if let Some(code) = failure.code() {
        warn!(
            target: DISPATCH_TARGET,
            id = %request.id,
            command,
            code = code.as_str(),
            error = %failure,
            "command failed with a structured error"
        );
    } else {
        error!(
            target: DISPATCH_TARGET,
            id = %request.id,
            command,
            error = ?failure,
            "command failed"
        );
    }
}
