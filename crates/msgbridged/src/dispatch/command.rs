//! Typed commands parsed from request envelopes.

use serde_json::{Map, Value};

use super::errors::DispatchError;

/// A validated command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Report the login state.
    State,
    /// Request a login code for a phone number.
    SendPhone {
        /// Phone number in international format.
        phone: String,
    },
    /// Submit the received login code.
    SendCode {
        /// Login code.
        code: String,
    },
    /// Submit the second-factor password.
    SendPassword {
        /// Account password.
        password: String,
    },
    /// List group conversations.
    ListGroups,
    /// Send a text message.
    SendMessage {
        /// Target conversation.
        chat_id: i64,
        /// Message text.
        text: String,
    },
    /// Press a button on a message.
    ClickButton {
        /// Conversation holding the message.
        chat_id: i64,
        /// Message carrying the keyboard.
        message_id: i64,
        /// What pressing the button does.
        action: ButtonAction,
    },
    /// Enable event forwarding.
    StartUpdates,
    /// Detach handlers and disconnect.
    Shutdown,
}

/// Effect of a button press.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Answer an inline button with its decoded callback data.
    Callback(Vec<u8>),
    /// Send the button label as a reply.
    Reply(String),
}

impl Command {
    /// Validates a command name and payload.
    ///
    /// Text fields accept strings or numbers; identifier fields accept
    /// integers or strings holding integers.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::UnknownCommand`] for unrecognised names and
    /// [`DispatchError::InvalidPayload`] for missing or malformed fields, or
    /// when a command that takes arguments receives a non-object payload.
    pub fn parse(name: Option<&str>, payload: &Value) -> Result<Self, DispatchError> {
        let Some(name) = name else {
            return Err(DispatchError::unknown_command("<missing>"));
        };
        match name {
            "state" => Ok(Self::State),
            "send_phone" => text_field(fields(payload)?, "phone")
                .map(|phone| Self::SendPhone { phone })
                .ok_or_else(|| DispatchError::invalid_payload("Phone number required")),
            "send_code" => text_field(fields(payload)?, "code")
                .map(|code| Self::SendCode { code })
                .ok_or_else(|| DispatchError::invalid_payload("Code and phone required")),
            "send_password" => text_field(fields(payload)?, "password")
                .map(|password| Self::SendPassword { password })
                .ok_or_else(|| DispatchError::invalid_payload("Password required")),
            "list_groups" => Ok(Self::ListGroups),
            "send_message" => parse_send_message(fields(payload)?),
            "click_button" => parse_click_button(fields(payload)?),
            "start_updates" => Ok(Self::StartUpdates),
            "shutdown" => Ok(Self::Shutdown),
            other => Err(DispatchError::unknown_command(other)),
        }
    }

    /// Canonical command name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::SendPhone { .. } => "send_phone",
            Self::SendCode { .. } => "send_code",
            Self::SendPassword { .. } => "send_password",
            Self::ListGroups => "list_groups",
            Self::SendMessage { .. } => "send_message",
            Self::ClickButton { .. } => "click_button",
            Self::StartUpdates => "start_updates",
            Self::Shutdown => "shutdown",
        }
    }

    /// Whether executing the command needs the external client.
    #[must_use]
    pub fn needs_client(&self) -> bool {
        !matches!(self, Self::State | Self::Shutdown)
    }
}

fn parse_send_message(payload: &Map<String, Value>) -> Result<Command, DispatchError> {
    let chat_id = integer_field(payload, "chat_id")?;
    let text = text_field(payload, "text");
    match (chat_id, text) {
        (Some(chat_id), Some(text)) => Ok(Command::SendMessage { chat_id, text }),
        _ => Err(DispatchError::invalid_payload("chat_id and text required")),
    }
}

fn parse_click_button(payload: &Map<String, Value>) -> Result<Command, DispatchError> {
    let chat_id = integer_field(payload, "chat_id")?;
    let message_id = integer_field(payload, "message_id")?;
    let (Some(chat_id), Some(message_id)) = (chat_id, message_id) else {
        return Err(DispatchError::invalid_payload(
            "chat_id and message_id required",
        ));
    };

    let action = if let Some(data) = text_field(payload, "data") {
        let bytes = hex::decode(&data).map_err(|error| {
            DispatchError::invalid_payload(format!("data must be hex encoded: {error}"))
        })?;
        ButtonAction::Callback(bytes)
    } else if let Some(text) = text_field(payload, "text") {
        ButtonAction::Reply(text)
    } else {
        return Err(DispatchError::invalid_payload(
            "Either data or text must be provided",
        ));
    };

    Ok(Command::ClickButton {
        chat_id,
        message_id,
        action,
    })
}

fn fields(payload: &Value) -> Result<&Map<String, Value>, DispatchError> {
    payload
        .as_object()
        .ok_or_else(|| DispatchError::invalid_payload("payload must be an object"))
}

/// Non-empty text, with numbers rendered as their decimal text.
fn text_field(payload: &Map<String, Value>, key: &str) -> Option<String> {
    match payload.get(key)? {
        Value::String(text) if !text.is_empty() => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Integer identifier; `null` and absent fields are treated as missing.
fn integer_field(payload: &Map<String, Value>, key: &str) -> Result<Option<i64>, DispatchError> {
    let invalid = || DispatchError::invalid_payload(format!("{key} must be an integer"));
    match payload.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(number)) => number.as_i64().map(Some).ok_or_else(invalid),
        Some(Value::String(text)) => text.trim().parse().map(Some).map_err(|_| invalid()),
        Some(_) => Err(invalid()),
    }
}
