//! Protocol16 value decoding.
//!
//! Truncation here is an error, unlike in packet framing: once a payload has been
//! framed and handed over, a short read means the payload itself is corrupt.

use crate::core::reader::Reader;
use crate::error::{ProtocolError, Result};
use crate::protocol::message::{EventData, OperationRequest, OperationResponse, Parameters};
use crate::protocol16::value::{type_code, Value};

/// Maximum nesting of container values.
pub const MAX_DEPTH: usize = 64;

#[inline]
fn u8_at(reader: &mut Reader<'_>, context: &'static str) -> Result<u8> {
    reader.read_u8().ok_or(ProtocolError::UnexpectedEof(context))
}

#[inline]
fn u16_at(reader: &mut Reader<'_>, context: &'static str) -> Result<u16> {
    reader
        .read_u16_be()
        .ok_or(ProtocolError::UnexpectedEof(context))
}

#[inline]
fn bytes_at<'a>(reader: &mut Reader<'a>, len: usize, context: &'static str) -> Result<&'a [u8]> {
    reader
        .read_bytes(len)
        .ok_or(ProtocolError::UnexpectedEof(context))
}

fn read_string(reader: &mut Reader<'_>) -> Result<String> {
    let len = u16_at(reader, "string length")? as usize;
    let bytes = bytes_at(reader, len, "string")?;
    String::from_utf8(bytes.to_vec()).map_err(|_| ProtocolError::InvalidUtf8)
}

/// Read a signed 32-bit collection length.
fn read_length(reader: &mut Reader<'_>, context: &'static str) -> Result<usize> {
    let len = reader
        .read_i32_be()
        .ok_or(ProtocolError::UnexpectedEof(context))?;
    usize::try_from(len).map_err(|_| ProtocolError::InvalidLength(len))
}

/// Read a `[key(1)] [type(1)] [value]` table preceded by a 16-bit count.
pub(crate) fn read_parameters(reader: &mut Reader<'_>, depth: usize) -> Result<Parameters> {
    let count = u16_at(reader, "parameter count")?;
    let mut parameters = Parameters::new();
    for _ in 0..count {
        let key = u8_at(reader, "parameter key")?;
        let value = read_typed(reader, depth)?;
        parameters.insert(key, value);
    }
    Ok(parameters)
}

pub(crate) fn read_operation_request(
    reader: &mut Reader<'_>,
    depth: usize,
) -> Result<OperationRequest> {
    let operation_code = u8_at(reader, "operation code")?;
    let parameters = read_parameters(reader, depth)?;
    Ok(OperationRequest {
        operation_code,
        parameters,
    })
}

pub(crate) fn read_operation_response(
    reader: &mut Reader<'_>,
    depth: usize,
) -> Result<OperationResponse> {
    let operation_code = u8_at(reader, "operation code")?;
    let return_code = reader
        .read_i16_be()
        .ok_or(ProtocolError::UnexpectedEof("return code"))?;
    let debug_message = match read_typed(reader, depth)? {
        Value::String(message) => Some(message),
        _ => None,
    };
    let parameters = read_parameters(reader, depth)?;
    Ok(OperationResponse {
        operation_code,
        return_code,
        debug_message,
        parameters,
    })
}

pub(crate) fn read_event(reader: &mut Reader<'_>, depth: usize) -> Result<EventData> {
    let code = u8_at(reader, "event code")?;
    let parameters = read_parameters(reader, depth)?;
    Ok(EventData { code, parameters })
}

/// Read a type code followed by the value it announces.
pub(crate) fn read_typed(reader: &mut Reader<'_>, depth: usize) -> Result<Value> {
    let code = u8_at(reader, "type code")?;
    read_value(reader, code, depth)
}

/// Read the body of a value whose type code is already known.
pub(crate) fn read_value(reader: &mut Reader<'_>, code: u8, depth: usize) -> Result<Value> {
    if depth >= MAX_DEPTH {
        return Err(ProtocolError::NestingTooDeep(MAX_DEPTH));
    }
    let nested = depth + 1;

    let value = match code {
        type_code::UNKNOWN | type_code::NULL => Value::Null,
        type_code::BOOLEAN => Value::Boolean(u8_at(reader, "boolean")? != 0),
        type_code::BYTE => Value::Byte(u8_at(reader, "byte")?),
        type_code::SHORT => Value::Short(
            reader
                .read_i16_be()
                .ok_or(ProtocolError::UnexpectedEof("short"))?,
        ),
        type_code::INTEGER => Value::Integer(
            reader
                .read_i32_be()
                .ok_or(ProtocolError::UnexpectedEof("integer"))?,
        ),
        type_code::LONG => Value::Long(
            reader
                .read_i64_be()
                .ok_or(ProtocolError::UnexpectedEof("long"))?,
        ),
        type_code::FLOAT => Value::Float(
            reader
                .read_f32_be()
                .ok_or(ProtocolError::UnexpectedEof("float"))?,
        ),
        type_code::DOUBLE => Value::Double(
            reader
                .read_f64_be()
                .ok_or(ProtocolError::UnexpectedEof("double"))?,
        ),
        type_code::STRING => Value::String(read_string(reader)?),
        type_code::BYTE_ARRAY => {
            let len = reader
                .read_u32_be()
                .ok_or(ProtocolError::UnexpectedEof("byte array length"))?
                as usize;
            Value::ByteArray(bytes_at(reader, len, "byte array")?.to_vec())
        }
        type_code::INTEGER_ARRAY => {
            let len = read_length(reader, "integer array length")?;
            let mut items = Vec::with_capacity(len.min(reader.remaining() / 4));
            for _ in 0..len {
                items.push(
                    reader
                        .read_i32_be()
                        .ok_or(ProtocolError::UnexpectedEof("integer array"))?,
                );
            }
            Value::IntegerArray(items)
        }
        type_code::STRING_ARRAY => {
            let len = u16_at(reader, "string array length")?;
            let mut items = Vec::with_capacity((len as usize).min(reader.remaining()));
            for _ in 0..len {
                items.push(read_string(reader)?);
            }
            Value::StringArray(items)
        }
        type_code::ARRAY => {
            let len = u16_at(reader, "array length")?;
            let element_type = u8_at(reader, "array element type")?;
            let mut items = Vec::with_capacity((len as usize).min(reader.remaining()));
            for _ in 0..len {
                items.push(read_value(reader, element_type, nested)?);
            }
            Value::Array {
                element_type,
                items,
            }
        }
        type_code::OBJECT_ARRAY => {
            let len = u16_at(reader, "object array length")?;
            let mut items = Vec::with_capacity((len as usize).min(reader.remaining()));
            for _ in 0..len {
                items.push(read_typed(reader, nested)?);
            }
            Value::ObjectArray(items)
        }
        type_code::HASHTABLE => {
            let len = u16_at(reader, "hashtable size")?;
            let mut entries = Vec::with_capacity((len as usize).min(reader.remaining()));
            for _ in 0..len {
                let key = read_typed(reader, nested)?;
                let value = read_typed(reader, nested)?;
                entries.push((key, value));
            }
            Value::Hashtable(entries)
        }
        type_code::DICTIONARY => {
            let key_type = u8_at(reader, "dictionary key type")?;
            let value_type = u8_at(reader, "dictionary value type")?;
            let len = u16_at(reader, "dictionary size")?;
            let mut entries = Vec::with_capacity((len as usize).min(reader.remaining()));
            for _ in 0..len {
                let key = read_declared(reader, key_type, nested)?;
                let value = read_declared(reader, value_type, nested)?;
                entries.push((key, value));
            }
            Value::Dictionary {
                key_type,
                value_type,
                entries,
            }
        }
        type_code::EVENT_DATA => Value::EventData(Box::new(read_event(reader, nested)?)),
        type_code::OPERATION_REQUEST => {
            Value::OperationRequest(Box::new(read_operation_request(reader, nested)?))
        }
        type_code::OPERATION_RESPONSE => {
            Value::OperationResponse(Box::new(read_operation_response(reader, nested)?))
        }
        other => return Err(ProtocolError::UnknownTypeCode(other)),
    };

    Ok(value)
}

/// Dictionary slots declared as unknown or null carry their own type code.
fn read_declared(reader: &mut Reader<'_>, declared: u8, depth: usize) -> Result<Value> {
    if declared == type_code::UNKNOWN || declared == type_code::NULL {
        read_typed(reader, depth)
    } else {
        read_value(reader, declared, depth)
    }
}
