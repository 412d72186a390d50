use crate::protocol::message::{EventData, OperationRequest, OperationResponse};
use serde::{Deserialize, Serialize};

/// Protocol16 type codes.
pub mod type_code {
    pub const UNKNOWN: u8 = 0;
    pub const NULL: u8 = 42;
    pub const DICTIONARY: u8 = 68;
    pub const STRING_ARRAY: u8 = 97;
    pub const BYTE: u8 = 98;
    pub const DOUBLE: u8 = 100;
    pub const EVENT_DATA: u8 = 101;
    pub const FLOAT: u8 = 102;
    pub const HASHTABLE: u8 = 104;
    pub const INTEGER: u8 = 105;
    pub const SHORT: u8 = 107;
    pub const LONG: u8 = 108;
    pub const INTEGER_ARRAY: u8 = 110;
    pub const BOOLEAN: u8 = 111;
    pub const OPERATION_RESPONSE: u8 = 112;
    pub const OPERATION_REQUEST: u8 = 113;
    pub const STRING: u8 = 115;
    pub const BYTE_ARRAY: u8 = 120;
    pub const ARRAY: u8 = 121;
    pub const OBJECT_ARRAY: u8 = 122;
}

/// A dynamically typed Protocol16 value.
///
/// Hashtable and dictionary entries keep wire order and allow any key type, so they
/// are stored as pairs rather than maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Byte(u8),
    Short(i16),
    Integer(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    String(String),
    ByteArray(Vec<u8>),
    IntegerArray(Vec<i32>),
    StringArray(Vec<String>),
    /// Homogeneous array; every element shares `element_type`.
    Array {
        element_type: u8,
        items: Vec<Value>,
    },
    ObjectArray(Vec<Value>),
    Hashtable(Vec<(Value, Value)>),
    /// Dictionary with declared key and value types (0 or 42 means per-entry typed).
    Dictionary {
        key_type: u8,
        value_type: u8,
        entries: Vec<(Value, Value)>,
    },
    EventData(Box<EventData>),
    OperationRequest(Box<OperationRequest>),
    OperationResponse(Box<OperationResponse>),
}

impl Value {
    /// Type code this value is written with.
    pub fn type_code(&self) -> u8 {
        match self {
            Value::Null => type_code::NULL,
            Value::Boolean(_) => type_code::BOOLEAN,
            Value::Byte(_) => type_code::BYTE,
            Value::Short(_) => type_code::SHORT,
            Value::Integer(_) => type_code::INTEGER,
            Value::Long(_) => type_code::LONG,
            Value::Float(_) => type_code::FLOAT,
            Value::Double(_) => type_code::DOUBLE,
            Value::String(_) => type_code::STRING,
            Value::ByteArray(_) => type_code::BYTE_ARRAY,
            Value::IntegerArray(_) => type_code::INTEGER_ARRAY,
            Value::StringArray(_) => type_code::STRING_ARRAY,
            Value::Array { .. } => type_code::ARRAY,
            Value::ObjectArray(_) => type_code::OBJECT_ARRAY,
            Value::Hashtable(_) => type_code::HASHTABLE,
            Value::Dictionary { .. } => type_code::DICTIONARY,
            Value::EventData(_) => type_code::EVENT_DATA,
            Value::OperationRequest(_) => type_code::OPERATION_REQUEST,
            Value::OperationResponse(_) => type_code::OPERATION_RESPONSE,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Widen any integral value to `i64`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Byte(v) => Some(i64::from(v)),
            Value::Short(v) => Some(i64::from(v)),
            Value::Integer(v) => Some(i64::from(v)),
            Value::Long(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Boolean(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::ByteArray(bytes) => Some(bytes),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integral_widening() {
        assert_eq!(Value::Byte(200).as_i64(), Some(200));
        assert_eq!(Value::Short(-3).as_i64(), Some(-3));
        assert_eq!(Value::Long(i64::MAX).as_i64(), Some(i64::MAX));
        assert_eq!(Value::Float(1.0).as_i64(), None);
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
    }

    #[test]
    fn test_type_codes() {
        assert_eq!(Value::Null.type_code(), type_code::NULL);
        assert_eq!(Value::String(String::new()).type_code(), b's');
        assert_eq!(Value::ByteArray(vec![]).type_code(), b'x');
        assert_eq!(
            Value::Array {
                element_type: type_code::BYTE,
                items: vec![]
            }
            .type_code(),
            b'y'
        );
    }
}
