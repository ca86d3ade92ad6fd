//! The closed set of value kinds a settings entry can hold.

use std::fmt;
use std::str::FromStr;

use crate::error::{Result, SettingsError};

/// A single settings value.
///
/// Exactly six kinds are representable. Each kind has a fixed type tag in the
/// binary framing, see [`ValueKind::tag`].
///
/// # Example
///
/// ```ignore
/// use settings_store::Value;
///
/// let volume: Value = 0.8f32.into();
/// assert_eq!(volume.as_float(), Some(0.8));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    Int(i32),
    Long(i64),
    Float(f32),
    String(String),
    Bytes(Vec<u8>),
}

/// The kind of a [`Value`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Bool,
    Int,
    Long,
    Float,
    String,
    Bytes,
}

impl ValueKind {
    /// All kinds, in tag order.
    pub const ALL: [ValueKind; 6] = [
        ValueKind::Bool,
        ValueKind::Int,
        ValueKind::Long,
        ValueKind::Float,
        ValueKind::String,
        ValueKind::Bytes,
    ];

    /// Type tag written before each payload in the binary framing.
    pub const fn tag(self) -> u8 {
        match self {
            ValueKind::Bool => 0,
            ValueKind::Int => 1,
            ValueKind::Long => 2,
            ValueKind::Float => 3,
            ValueKind::String => 4,
            ValueKind::Bytes => 5,
        }
    }

    /// Inverse of [`ValueKind::tag`]. Returns `None` for unknown tags.
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(ValueKind::Bool),
            1 => Some(ValueKind::Int),
            2 => Some(ValueKind::Long),
            3 => Some(ValueKind::Float),
            4 => Some(ValueKind::String),
            5 => Some(ValueKind::Bytes),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            ValueKind::Bool => "bool",
            ValueKind::Int => "int",
            ValueKind::Long => "long",
            ValueKind::Float => "float",
            ValueKind::String => "string",
            ValueKind::Bytes => "bytes",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ValueKind {
    type Err = SettingsError;

    /// Parse a kind name such as `"float"`. Any other name is rejected with
    /// [`SettingsError::InvalidValueType`].
    fn from_str(s: &str) -> Result<Self> {
        ValueKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| SettingsError::InvalidValueType {
                key: None,
                expected: "one of bool, int, long, float, string, bytes".to_string(),
                found: s.to_string(),
            })
    }
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Value::Bool(_) => ValueKind::Bool,
            Value::Int(_) => ValueKind::Int,
            Value::Long(_) => ValueKind::Long,
            Value::Float(_) => ValueKind::Float,
            Value::String(_) => ValueKind::String,
            Value::Bytes(_) => ValueKind::Bytes,
        }
    }

    /// Parse a textual representation into a value of the given kind.
    ///
    /// Bytes are read as hex (`"00ff10"`). This is how environment overrides,
    /// which are always strings, are read through the typed getters.
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self> {
        let invalid = || SettingsError::InvalidValueType {
            key: None,
            expected: kind.to_string(),
            found: format!("{:?}", text),
        };
        let trimmed = text.trim();

        let value = match kind {
            ValueKind::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => Value::Bool(true),
                "false" | "0" | "no" | "off" => Value::Bool(false),
                _ => return Err(invalid()),
            },
            ValueKind::Int => Value::Int(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::Long => Value::Long(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::Float => Value::Float(trimmed.parse().map_err(|_| invalid())?),
            ValueKind::String => Value::String(text.to_string()),
            ValueKind::Bytes => Value::Bytes(decode_hex(trimmed).ok_or_else(invalid)?),
        };
        Ok(value)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i32> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_long(&self) -> Option<i64> {
        match self {
            Value::Long(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_string(self) -> Option<String> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_bytes(self) -> Option<Vec<u8>> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::String(v) => f.write_str(v),
            Value::Bytes(v) => {
                for byte in v {
                    write!(f, "{:02x}", byte)?;
                }
                Ok(())
            }
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Long(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Bytes(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Bytes(v.to_vec())
    }
}

fn decode_hex(text: &str) -> Option<Vec<u8>> {
    if text.len() % 2 != 0 {
        return None;
    }
    text.as_bytes()
        .chunks(2)
        .map(|pair| {
            let digits = std::str::from_utf8(pair).ok()?;
            u8::from_str_radix(digits, 16).ok()
        })
        .collect()
}
