//! # Protocol16 Values
//!
//! Decoder for the typed value encoding Photon uses inside operation requests,
//! operation responses and events.
//!
//! The parser only depends on the [`ValueDecoder`] trait, so a different value
//! encoding (or a stub in tests) can be swapped in without touching packet handling.
//! [`Protocol16`] is the default implementation.
//!
//! ## Layout
//! ```text
//! Request:  [OpCode(1)] [Parameters]
//! Response: [OpCode(1)] [ReturnCode(2)] [DebugMessage(typed)] [Parameters]
//! Event:    [Code(1)] [Parameters]
//! Parameters: [Count(2)] ([Key(1)] [TypeCode(1)] [Value])*
//! ```
//!
//! ## Usage
//! ```rust
//! use photon_protocol::protocol::message::{EventData, Parameters};
//! use photon_protocol::protocol16::{Protocol16, Value, ValueDecoder};
//!
//! let mut parameters = Parameters::new();
//! parameters.insert(0, Value::Integer(42));
//! let event = EventData { code: 3, parameters };
//!
//! let bytes = Protocol16::encode_event(&event);
//! assert_eq!(Protocol16.decode_event(&bytes).unwrap(), event);
//! ```

pub mod deserializer;
pub mod serializer;
pub mod value;

pub use value::{type_code, Value};

use crate::core::reader::Reader;
use crate::error::Result;
use crate::protocol::message::{EventData, OperationRequest, OperationResponse};

/// Turns an operation payload into a typed message.
///
/// Implementations must be stateless with respect to the parser: each call sees
/// one complete payload.
pub trait ValueDecoder {
    fn decode_request(&self, payload: &[u8]) -> Result<OperationRequest>;
    fn decode_response(&self, payload: &[u8]) -> Result<OperationResponse>;
    fn decode_event(&self, payload: &[u8]) -> Result<EventData>;
}

/// The Protocol16 value encoding.
#[derive(Debug, Clone, Copy, Default)]
pub struct Protocol16;

impl ValueDecoder for Protocol16 {
    fn decode_request(&self, payload: &[u8]) -> Result<OperationRequest> {
        deserializer::read_operation_request(&mut Reader::new(payload), 0)
    }

    fn decode_response(&self, payload: &[u8]) -> Result<OperationResponse> {
        deserializer::read_operation_response(&mut Reader::new(payload), 0)
    }

    fn decode_event(&self, payload: &[u8]) -> Result<EventData> {
        deserializer::read_event(&mut Reader::new(payload), 0)
    }
}

impl Protocol16 {
    pub fn encode_request(request: &OperationRequest) -> Vec<u8> {
        let mut out = Vec::new();
        serializer::write_operation_request(&mut out, request);
        out
    }

    pub fn encode_response(response: &OperationResponse) -> Vec<u8> {
        let mut out = Vec::new();
        serializer::write_operation_response(&mut out, response);
        out
    }

    pub fn encode_event(event: &EventData) -> Vec<u8> {
        let mut out = Vec::new();
        serializer::write_event(&mut out, event);
        out
    }

    /// Decode a single type-prefixed value.
    pub fn decode_value(bytes: &[u8]) -> Result<Value> {
        deserializer::read_typed(&mut Reader::new(bytes), 0)
    }

    /// Encode a single type-prefixed value.
    pub fn encode_value(value: &Value) -> Vec<u8> {
        let mut out = Vec::new();
        serializer::write_typed(&mut out, value);
        out
    }
}
