use crate::protocol16::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Parameter table of an operation or event, keyed by parameter code.
pub type Parameters = BTreeMap<u8, Value>;

/// Application message type tag carried by reliable and unreliable commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    OperationRequest,
    OperationResponse,
    Event,
    Unknown(u8),
}

impl From<u8> for MessageType {
    fn from(tag: u8) -> Self {
        match tag {
            2 => MessageType::OperationRequest,
            3 => MessageType::OperationResponse,
            4 => MessageType::Event,
            other => MessageType::Unknown(other),
        }
    }
}

impl From<MessageType> for u8 {
    fn from(kind: MessageType) -> Self {
        match kind {
            MessageType::OperationRequest => 2,
            MessageType::OperationResponse => 3,
            MessageType::Event => 4,
            MessageType::Unknown(tag) => tag,
        }
    }
}

/// Operation sent from client to server.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationRequest {
    pub operation_code: u8,
    pub parameters: Parameters,
}

/// Server reply to an operation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct OperationResponse {
    pub operation_code: u8,
    pub return_code: i16,
    pub debug_message: Option<String>,
    pub parameters: Parameters,
}

/// Server push event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventData {
    pub code: u8,
    pub parameters: Parameters,
}

/// A decoded application message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Message {
    Request(OperationRequest),
    Response(OperationResponse),
    Event(EventData),
}

impl Message {
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::Request(_) => MessageType::OperationRequest,
            Message::Response(_) => MessageType::OperationResponse,
            Message::Event(_) => MessageType::Event,
        }
    }

    /// Operation code for requests and responses, event code for events.
    pub fn code(&self) -> u8 {
        match self {
            Message::Request(request) => request.operation_code,
            Message::Response(response) => response.operation_code,
            Message::Event(event) => event.code,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        match self {
            Message::Request(request) => &request.parameters,
            Message::Response(response) => &response.parameters,
            Message::Event(event) => &event.parameters,
        }
    }
}
