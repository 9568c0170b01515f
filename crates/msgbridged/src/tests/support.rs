//! Test doubles and harnesses shared by the worker suites.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream, Lines};

use msgbridge_config::{ApiCredentials, Config};
use msgbridge_protocol::{OutputLine, Request, Response};

use crate::auth::UserIdentity;
use crate::bootstrap::BootstrapError;
use crate::client::{
    ClientConnector, ClientError, Dialog, ExternalClient, IncomingMessage, NotificationHandler,
    SignIn, Subscription,
};
use crate::dispatch::CommandDispatcher;
use crate::events::EventQueue;
use crate::lifecycle::LifecycleReporter;
use crate::transport::{LineReader, LineSink, TransportError};
use crate::worker::run_worker;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub fn credentials() -> ApiCredentials {
    Config::new(12345, "0123456789abcdef", "/tmp/msgbridge-tests/session").credentials()
}

pub fn user() -> UserIdentity {
    UserIdentity {
        id: 777,
        first_name: "Ada".to_owned(),
        last_name: "Lovelace".to_owned(),
        phone: "15550100".to_owned(),
    }
}

pub fn message(id: i64, chat_id: i64, text: &str) -> IncomingMessage {
    IncomingMessage {
        id,
        chat_id,
        sender_id: Some(99),
        text: Some(text.to_owned()),
        outgoing: false,
        buttons: Vec::new(),
    }
}

pub fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => panic!("payload must be an object, got {other}"),
    }
}

/// Scripted stand-in for the remote messaging service.
///
/// Clones share state, so a test keeps one handle while the connector and
/// client it produced hold others.
#[derive(Clone, Default)]
pub struct FakeBackend {
    state: Rc<RefCell<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    authorized: bool,
    user: UserIdentity,
    password_hint: Option<String>,
    accepted_code: Option<String>,
    dialogs: Vec<Dialog>,
    echo_sent: bool,
    connect_failures: VecDeque<ClientError>,
    failures: HashMap<&'static str, VecDeque<ClientError>>,
    connects: usize,
    calls: Vec<&'static str>,
    sent: Vec<(i64, String)>,
    callbacks: Vec<(i64, i64, Vec<u8>)>,
    message_handlers: Vec<Option<NotificationHandler>>,
    edit_handlers: Vec<Option<NotificationHandler>>,
}

#[derive(Clone, Copy)]
enum HandlerSlot {
    Message,
    Edit,
}

impl FakeState {
    fn handlers(&mut self, slot: HandlerSlot) -> &mut Vec<Option<NotificationHandler>> {
        match slot {
            HandlerSlot::Message => &mut self.message_handlers,
            HandlerSlot::Edit => &mut self.edit_handlers,
        }
    }
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// The persisted session is already signed in as `user`.
    pub fn authorized_as(self, user: UserIdentity) -> Self {
        {
            let mut state = self.state.borrow_mut();
            state.authorized = true;
            state.user = user;
        }
        self
    }

    /// Sign-in completes as `user` once the flow finishes.
    pub fn signs_in_as(self, user: UserIdentity) -> Self {
        self.state.borrow_mut().user = user;
        self
    }

    /// Accepted codes are followed by a password step with `hint`.
    pub fn with_password(self, hint: &str) -> Self {
        self.state.borrow_mut().password_hint = Some(hint.to_owned());
        self
    }

    /// Only `code` is accepted; anything else is rejected.
    pub fn accepting_code(self, code: &str) -> Self {
        self.state.borrow_mut().accepted_code = Some(code.to_owned());
        self
    }

    pub fn with_dialogs(self, dialogs: Vec<Dialog>) -> Self {
        self.state.borrow_mut().dialogs = dialogs;
        self
    }

    /// Sent messages come back as outgoing message notifications.
    pub fn echoing_sent_messages(self) -> Self {
        self.state.borrow_mut().echo_sent = true;
        self
    }

    /// Makes the next call of `operation` fail with `error`.
    pub fn fail_next(&self, operation: &'static str, error: ClientError) {
        self.state
            .borrow_mut()
            .failures
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Makes the next connection attempt fail with `error`.
    pub fn fail_connect(&self, error: ClientError) {
        self.state.borrow_mut().connect_failures.push_back(error);
    }

    pub fn connector(&self) -> FakeConnector {
        FakeConnector {
            backend: self.clone(),
        }
    }

    pub fn connects(&self) -> usize {
        self.state.borrow().connects
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.borrow().calls.clone()
    }

    pub fn called(&self, operation: &str) -> bool {
        self.state.borrow().calls.iter().any(|call| *call == operation)
    }

    pub fn sent(&self) -> Vec<(i64, String)> {
        self.state.borrow().sent.clone()
    }

    pub fn callbacks(&self) -> Vec<(i64, i64, Vec<u8>)> {
        self.state.borrow().callbacks.clone()
    }

    pub fn attached_handlers(&self) -> usize {
        let state = self.state.borrow();
        state
            .message_handlers
            .iter()
            .chain(&state.edit_handlers)
            .filter(|handler| handler.is_some())
            .count()
    }

    /// Delivers a new-message notification to every attached handler.
    pub fn emit_message(&self, message: IncomingMessage) {
        self.emit(HandlerSlot::Message, message);
    }

    /// Delivers an edited-message notification to every attached handler.
    pub fn emit_edit(&self, message: IncomingMessage) {
        self.emit(HandlerSlot::Edit, message);
    }

    fn emit(&self, slot: HandlerSlot, message: IncomingMessage) {
        let handlers: Vec<NotificationHandler> = self
            .state
            .borrow_mut()
            .handlers(slot)
            .iter()
            .flatten()
            .cloned()
            .collect();
        for handler in handlers {
            handler(message.clone());
        }
    }

    fn subscribe(&self, slot: HandlerSlot, handler: NotificationHandler) -> Subscription {
        let index = {
            let mut state = self.state.borrow_mut();
            let handlers = state.handlers(slot);
            handlers.push(Some(handler));
            handlers.len() - 1
        };
        let state = Rc::clone(&self.state);
        Subscription::new(move || {
            if let Some(entry) = state.borrow_mut().handlers(slot).get_mut(index) {
                *entry = None;
            }
        })
    }

    fn remote(&self, operation: &'static str) -> Result<(), ClientError> {
        let mut state = self.state.borrow_mut();
        state.calls.push(operation);
        match state.failures.get_mut(operation).and_then(VecDeque::pop_front) {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub struct FakeConnector {
    backend: FakeBackend,
}

#[async_trait(?Send)]
impl ClientConnector for FakeConnector {
    async fn connect(
        &self,
        _credentials: &ApiCredentials,
    ) -> Result<Box<dyn ExternalClient>, ClientError> {
        let failure = {
            let mut state = self.backend.state.borrow_mut();
            state.connects += 1;
            state.connect_failures.pop_front()
        };
        match failure {
            Some(error) => Err(error),
            None => Ok(Box::new(FakeClient {
                backend: self.backend.clone(),
            })),
        }
    }
}

struct FakeClient {
    backend: FakeBackend,
}

#[async_trait(?Send)]
impl ExternalClient for FakeClient {
    async fn is_authorized(&self) -> Result<bool, ClientError> {
        self.backend.remote("is_authorized")?;
        Ok(self.backend.state.borrow().authorized)
    }

    async fn start(&self) -> Result<(), ClientError> {
        self.backend.remote("start")
    }

    async fn current_user(&self) -> Result<UserIdentity, ClientError> {
        self.backend.remote("current_user")?;
        Ok(self.backend.state.borrow().user.clone())
    }

    async fn request_login_code(&self, _phone: &str) -> Result<(), ClientError> {
        self.backend.remote("request_login_code")
    }

    async fn sign_in(&self, _phone: &str, code: &str) -> Result<SignIn, ClientError> {
        self.backend.remote("sign_in")?;
        let mut state = self.backend.state.borrow_mut();
        if state
            .accepted_code
            .as_deref()
            .is_some_and(|accepted| accepted != code)
        {
            return Err(ClientError::rejected("PHONE_CODE_INVALID"));
        }
        if let Some(hint) = state.password_hint.clone() {
            return Ok(SignIn::PasswordRequired { hint });
        }
        state.authorized = true;
        Ok(SignIn::Authorized(state.user.clone()))
    }

    async fn check_password(&self, _password: &str) -> Result<UserIdentity, ClientError> {
        self.backend.remote("check_password")?;
        let mut state = self.backend.state.borrow_mut();
        state.authorized = true;
        Ok(state.user.clone())
    }

    async fn dialogs(&self) -> Result<Vec<Dialog>, ClientError> {
        self.backend.remote("dialogs")?;
        Ok(self.backend.state.borrow().dialogs.clone())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), ClientError> {
        self.backend.remote("send_message")?;
        let echo = {
            let mut state = self.backend.state.borrow_mut();
            state.sent.push((chat_id, text.to_owned()));
            state.echo_sent.then(|| IncomingMessage {
                id: i64::try_from(state.sent.len()).unwrap_or_default(),
                chat_id,
                sender_id: Some(state.user.id),
                text: Some(text.to_owned()),
                outgoing: true,
                buttons: Vec::new(),
            })
        };
        if let Some(echo) = echo {
            self.backend.emit_message(echo);
        }
        Ok(())
    }

    async fn press_callback(
        &self,
        chat_id: i64,
        message_id: i64,
        data: &[u8],
    ) -> Result<(), ClientError> {
        self.backend.remote("press_callback")?;
        self.backend
            .state
            .borrow_mut()
            .callbacks
            .push((chat_id, message_id, data.to_vec()));
        Ok(())
    }

    fn on_message(&self, handler: NotificationHandler) -> Subscription {
        self.backend.subscribe(HandlerSlot::Message, handler)
    }

    fn on_message_edited(&self, handler: NotificationHandler) -> Subscription {
        self.backend.subscribe(HandlerSlot::Edit, handler)
    }

    async fn disconnect(&self) -> Result<(), ClientError> {
        self.backend.remote("disconnect")
    }
}

/// Lifecycle events captured by [`RecordingLifecycleReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleEvent {
    WorkerStarting,
    BootstrapFailed(String),
    WorkerStopped,
    ClientConnecting,
    ClientReady { authorized: bool },
    ClientFailed(String),
    EventsDropped { newly: u64, total: u64 },
}

#[derive(Default)]
pub struct RecordingLifecycleReporter {
    events: Mutex<Vec<LifecycleEvent>>,
}

impl RecordingLifecycleReporter {
    pub fn events(&self) -> Vec<LifecycleEvent> {
        self.events.lock().expect("lock reporter events").clone()
    }

    fn record(&self, event: LifecycleEvent) {
        self.events.lock().expect("lock reporter events").push(event);
    }
}

impl LifecycleReporter for RecordingLifecycleReporter {
    fn worker_starting(&self, _config: &Config) {
        self.record(LifecycleEvent::WorkerStarting);
    }

    fn bootstrap_failed(&self, error: &BootstrapError) {
        self.record(LifecycleEvent::BootstrapFailed(error.to_string()));
    }

    fn worker_stopped(&self) {
        self.record(LifecycleEvent::WorkerStopped);
    }

    fn client_connecting(&self) {
        self.record(LifecycleEvent::ClientConnecting);
    }

    fn client_ready(&self, authorized: bool) {
        self.record(LifecycleEvent::ClientReady { authorized });
    }

    fn client_failed(&self, error: &ClientError) {
        self.record(LifecycleEvent::ClientFailed(error.to_string()));
    }

    fn events_dropped(&self, newly_dropped: u64, total_dropped: u64) {
        self.record(LifecycleEvent::EventsDropped {
            newly: newly_dropped,
            total: total_dropped,
        });
    }
}

/// Dispatcher wired to a fake backend, driven without the transport.
pub struct DispatchWorld {
    pub backend: FakeBackend,
    pub queue: Arc<EventQueue>,
    pub reporter: Arc<RecordingLifecycleReporter>,
    pub dispatcher: CommandDispatcher<FakeConnector>,
}

impl DispatchWorld {
    pub fn new(backend: FakeBackend) -> Self {
        let queue = Arc::new(EventQueue::new());
        let reporter = Arc::new(RecordingLifecycleReporter::default());
        let dispatcher = CommandDispatcher::new(
            credentials(),
            backend.connector(),
            Arc::clone(&queue),
            reporter.clone(),
        );
        Self {
            backend,
            queue,
            reporter,
            dispatcher,
        }
    }

    pub async fn call(&mut self, id: &str, command: &str, payload: Value) -> Response {
        let request = Request::new(id, command, object(payload));
        self.dispatcher.dispatch(&request).await
    }

    pub fn queued_ids(&self) -> Vec<i64> {
        std::iter::from_fn(|| self.queue.try_pop())
            .map(|event| event.message.id)
            .collect()
    }
}

/// Parent side of a worker running over in-memory pipes.
pub struct Parent {
    input: Option<DuplexStream>,
    output: Lines<BufReader<DuplexStream>>,
}

impl Parent {
    pub async fn send_line(&mut self, line: &str) {
        let input = self.input.as_mut().expect("input still open");
        input.write_all(line.as_bytes()).await.expect("write line");
        input.write_all(b"\n").await.expect("write newline");
        input.flush().await.expect("flush input");
    }

    pub async fn send(&mut self, id: &str, command: &str, payload: Value) {
        let request = Request::new(id, command, object(payload));
        let line = serde_json::to_string(&request).expect("serialize request");
        self.send_line(&line).await;
    }

    pub async fn next_line(&mut self) -> Option<String> {
        tokio::time::timeout(READ_TIMEOUT, self.output.next_line())
            .await
            .expect("worker produced no output in time")
            .expect("read worker output")
    }

    pub async fn next_output(&mut self) -> OutputLine {
        let line = self.next_line().await.expect("worker output ended");
        OutputLine::parse(&line).expect("output line decodes")
    }

    /// Skips event lines until the next response.
    pub async fn next_response(&mut self) -> Response {
        loop {
            if let OutputLine::Response(response) = self.next_output().await {
                return response;
            }
        }
    }

    /// Closes stdin and collects everything written afterwards.
    pub async fn close(mut self) -> Vec<String> {
        drop(self.input.take());
        let mut rest = Vec::new();
        while let Some(line) = self.next_line().await {
            rest.push(line);
        }
        rest
    }
}

/// Builds a worker over in-memory pipes, returning the worker future and
/// the parent end.
pub fn spawn_worker(
    backend: &FakeBackend,
    reporter: Arc<RecordingLifecycleReporter>,
) -> (impl Future<Output = Result<(), TransportError>>, Parent) {
    let (parent_input, worker_input) = tokio::io::duplex(64 * 1024);
    let (worker_output, parent_output) = tokio::io::duplex(64 * 1024);
    let queue = Arc::new(EventQueue::new());
    let dispatcher = CommandDispatcher::new(
        credentials(),
        backend.connector(),
        Arc::clone(&queue),
        reporter.clone(),
    );
    let worker = run_worker(
        LineReader::new(BufReader::new(worker_input)),
        LineSink::new(worker_output),
        dispatcher,
        queue,
        reporter,
    );
    let parent = Parent {
        input: Some(parent_input),
        output: BufReader::new(parent_output).lines(),
    };
    (worker, parent)
}
