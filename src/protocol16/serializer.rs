//! Protocol16 value encoding.
//!
//! The decoder never needs this; it lets tooling and tests produce payloads that
//! are byte-compatible with what a Photon server emits.

use crate::protocol::message::{EventData, OperationRequest, OperationResponse, Parameters};
use crate::protocol16::value::{type_code, Value};

const MAX_COUNT: usize = u16::MAX as usize;

/// Strings longer than 65535 bytes are cut at the last char boundary that fits.
fn write_string(out: &mut Vec<u8>, s: &str) {
    let mut len = s.len().min(MAX_COUNT);
    while !s.is_char_boundary(len) {
        len -= 1;
    }
    out.extend_from_slice(&(len as u16).to_be_bytes());
    out.extend_from_slice(&s.as_bytes()[..len]);
}

/// Write a u16 element count and return it. Callers write exactly that many items.
fn write_count(out: &mut Vec<u8>, len: usize) -> usize {
    let count = len.min(MAX_COUNT);
    out.extend_from_slice(&(count as u16).to_be_bytes());
    count
}

pub(crate) fn write_parameters(out: &mut Vec<u8>, parameters: &Parameters) {
    let count = write_count(out, parameters.len());
    for (key, value) in parameters.iter().take(count) {
        out.push(*key);
        write_typed(out, value);
    }
}

pub(crate) fn write_operation_request(out: &mut Vec<u8>, request: &OperationRequest) {
    out.push(request.operation_code);
    write_parameters(out, &request.parameters);
}

pub(crate) fn write_operation_response(out: &mut Vec<u8>, response: &OperationResponse) {
    out.push(response.operation_code);
    out.extend_from_slice(&response.return_code.to_be_bytes());
    match &response.debug_message {
        Some(message) => {
            out.push(type_code::STRING);
            write_string(out, message);
        }
        None => out.push(type_code::NULL),
    }
    write_parameters(out, &response.parameters);
}

pub(crate) fn write_event(out: &mut Vec<u8>, event: &EventData) {
    out.push(event.code);
    write_parameters(out, &event.parameters);
}

/// Write a type code followed by the value body.
pub fn write_typed(out: &mut Vec<u8>, value: &Value) {
    out.push(value.type_code());
    write_value(out, value);
}

/// Write a value body without its type code.
///
/// Collections beyond their wire count limit (65535 entries, or `u32`/`i32` for
/// byte and integer arrays) are truncated so the count always matches what follows.
pub fn write_value(out: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Null => {}
        Value::Boolean(v) => out.push(u8::from(*v)),
        Value::Byte(v) => out.push(*v),
        Value::Short(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Integer(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Float(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::Double(v) => out.extend_from_slice(&v.to_be_bytes()),
        Value::String(s) => write_string(out, s),
        Value::ByteArray(bytes) => {
            let bytes = &bytes[..bytes.len().min(u32::MAX as usize)];
            out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
            out.extend_from_slice(bytes);
        }
        Value::IntegerArray(items) => {
            let items = &items[..items.len().min(i32::MAX as usize)];
            out.extend_from_slice(&(items.len() as i32).to_be_bytes());
            for item in items {
                out.extend_from_slice(&item.to_be_bytes());
            }
        }
        Value::StringArray(items) => {
            let count = write_count(out, items.len());
            for item in items.iter().take(count) {
                write_string(out, item);
            }
        }
        Value::Array {
            element_type,
            items,
        } => {
            let count = write_count(out, items.len());
            out.push(*element_type);
            for item in items.iter().take(count) {
                write_value(out, item);
            }
        }
        Value::ObjectArray(items) => {
            let count = write_count(out, items.len());
            for item in items.iter().take(count) {
                write_typed(out, item);
            }
        }
        Value::Hashtable(entries) => {
            let count = write_count(out, entries.len());
            for (key, value) in entries.iter().take(count) {
                write_typed(out, key);
                write_typed(out, value);
            }
        }
        Value::Dictionary {
            key_type,
            value_type,
            entries,
        } => {
            out.push(*key_type);
            out.push(*value_type);
            let count = write_count(out, entries.len());
            for (key, value) in entries.iter().take(count) {
                write_declared(out, *key_type, key);
                write_declared(out, *value_type, value);
            }
        }
        Value::EventData(event) => write_event(out, event),
        Value::OperationRequest(request) => write_operation_request(out, request),
        Value::OperationResponse(response) => write_operation_response(out, response),
    }
}

fn write_declared(out: &mut Vec<u8>, declared: u8, value: &Value) {
    if declared == type_code::UNKNOWN || declared == type_code::NULL {
        write_typed(out, value);
    } else {
        write_value(out, value);
    }
}
