use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{MessageError, Result};

/// Field every diagnostics message is expected to carry.
pub const CURRENT_POSITION: &str = "current_position";

/// A decoded message: a JSON object with its fields in received order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Message {
    fields: Map<String, Value>,
}

impl Message {
    /// Decode one complete message.
    ///
    /// Bytes must be UTF-8 ([`MessageError::Decode`]), the text must be JSON
    /// ([`MessageError::Parse`]) and the value must be an object
    /// ([`MessageError::NotAnObject`]).
    pub fn decode(raw: &[u8]) -> Result<Self> {
        let text = std::str::from_utf8(raw).map_err(|source| MessageError::Decode {
            source,
            raw: Bytes::copy_from_slice(raw),
        })?;

        let value: Value = serde_json::from_str(text).map_err(|source| MessageError::Parse {
            source,
            raw: Bytes::copy_from_slice(raw),
        })?;

        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(MessageError::NotAnObject {
                kind: json_kind(&other),
                raw: Bytes::copy_from_slice(raw),
            }),
        }
    }

    /// Look up `current_position`. Absence is not an error.
    pub fn current_position(&self) -> Position<'_> {
        match self.fields.get(CURRENT_POSITION) {
            Some(value) => Position::Present(value),
            None => Position::Missing,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Compact JSON encoding, suitable for either framing mode.
    pub fn to_bytes(&self) -> Result<Bytes> {
        serde_json::to_vec(&self.fields)
            .map(Bytes::from)
            .map_err(|err| MessageError::Io(std::io::Error::other(err)))
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.fields)
    }
}

impl From<Map<String, Value>> for Message {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

impl TryFrom<Value> for Message {
    type Error = MessageError;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => {
                let raw = Bytes::from(other.to_string());
                Err(MessageError::NotAnObject {
                    kind: json_kind(&other),
                    raw,
                })
            }
        }
    }
}

/// Renders as compact JSON.
impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = serde_json::to_string(&self.fields).map_err(|_| fmt::Error)?;
        f.write_str(&text)
    }
}

/// The `current_position` of a message.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Position<'a> {
    Present(&'a Value),
    Missing,
}

impl<'a> Position<'a> {
    pub fn value(self) -> Option<&'a Value> {
        match self {
            Self::Present(value) => Some(value),
            Self::Missing => None,
        }
    }

    pub fn is_missing(self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Compact JSON of the value, or `undefined` when the field is absent.
impl fmt::Display for Position<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Present(value) => write!(f, "{value}"),
            Self::Missing => f.write_str("undefined"),
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
