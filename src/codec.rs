//! Binary framing for settings snapshots.
//!
//! A snapshot is a big-endian `i32` entry count followed by that many
//! records, each a length-prefixed UTF-8 key, a one byte type tag and the
//! kind-specific payload:
//!
//! | tag | kind   | payload                          |
//! |-----|--------|----------------------------------|
//! | 0   | bool   | 1 byte                           |
//! | 1   | int    | 4 bytes                          |
//! | 2   | long   | 8 bytes                          |
//! | 3   | float  | 4 bytes, IEEE-754                |
//! | 4   | string | `u16` length + UTF-8             |
//! | 5   | bytes  | `i32` length + raw bytes         |
//!
//! The file must end exactly after the last record. A count of zero is
//! rejected, so an empty store cannot be saved.

use std::collections::HashMap;

use thiserror::Error;

use crate::store::Store;
use crate::value::{Value, ValueKind};

/// Reasons a buffer is not a valid snapshot, or a store cannot be framed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Invalid entry count {0}: must be greater than zero")]
    BadHeader(i32),

    #[error("Unexpected end of data: need {needed} bytes at offset {offset}, have {available}")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    #[error("Unknown type tag {tag} for key '{key}'")]
    UnknownTag { key: String, tag: u8 },

    #[error("Negative byte length {0}")]
    NegativeLength(i32),

    #[error("Invalid UTF-8 in string at offset {0}")]
    InvalidUtf8(usize),

    #[error("Trailing data: {remaining} bytes after the last entry")]
    TrailingData { remaining: usize },

    #[error("String of {0} bytes exceeds the 65535 byte limit")]
    StringTooLong(usize),

    #[error("Byte payload of {0} bytes exceeds the i32 length limit")]
    BytesTooLong(usize),

    #[error("Too many entries to frame: {0}")]
    TooManyEntries(usize),
}

/// Encode every entry of `store`.
pub fn encode(store: &Store) -> Result<Vec<u8>, CodecError> {
    let count = i32::try_from(store.len()).map_err(|_| CodecError::TooManyEntries(store.len()))?;

    let mut out = Vec::with_capacity(32);
    out.extend_from_slice(&count.to_be_bytes());

    for (key, value) in store {
        write_str(&mut out, key)?;
        out.push(value.kind().tag());

        match value {
            Value::Bool(v) => out.push(u8::from(*v)),
            Value::Int(v) => out.extend_from_slice(&v.to_be_bytes()),
            Value::Long(v) => out.extend_from_slice(&v.to_be_bytes()),
            Value::Float(v) => out.extend_from_slice(&v.to_bits().to_be_bytes()),
            Value::String(v) => write_str(&mut out, v)?,
            Value::Bytes(v) => {
                out.extend_from_slice(&bytes_len(v.len())?.to_be_bytes());
                out.extend_from_slice(v);
            }
        }
    }

    Ok(out)
}

/// Decode a snapshot. Nothing is returned unless the whole buffer is valid.
pub fn decode(bytes: &[u8]) -> Result<Store, CodecError> {
    let mut reader = Reader::new(bytes);

    let count = reader.read_i32()?;
    if count <= 0 {
        return Err(CodecError::BadHeader(count));
    }

    // Cap the preallocation; the count is untrusted.
    let mut entries = HashMap::with_capacity((count as usize).min(1024));

    for _ in 0..count {
        let key = reader.read_str()?;
        let tag = reader.read_u8()?;
        let kind = ValueKind::from_tag(tag).ok_or_else(|| CodecError::UnknownTag {
            key: key.clone(),
            tag,
        })?;

        let value = match kind {
            ValueKind::Bool => Value::Bool(reader.read_u8()? != 0),
            ValueKind::Int => Value::Int(reader.read_i32()?),
            ValueKind::Long => Value::Long(i64::from_be_bytes(reader.read_array()?)),
            ValueKind::Float => Value::Float(f32::from_bits(u32::from_be_bytes(
                reader.read_array()?,
            ))),
            ValueKind::String => Value::String(reader.read_str()?),
            ValueKind::Bytes => {
                let len = reader.read_i32()?;
                let len = usize::try_from(len).map_err(|_| CodecError::NegativeLength(len))?;
                Value::Bytes(reader.take(len)?.to_vec())
            }
        };

        entries.insert(key, value);
    }

    if reader.remaining() > 0 {
        return Err(CodecError::TrailingData {
            remaining: reader.remaining(),
        });
    }

    Ok(Store::from_entries(entries))
}

fn bytes_len(len: usize) -> Result<i32, CodecError> {
    i32::try_from(len).map_err(|_| CodecError::BytesTooLong(len))
}

fn write_str(out: &mut Vec<u8>, s: &str) -> Result<(), CodecError> {
    let len = u16::try_from(s.len()).map_err(|_| CodecError::StringTooLong(s.len()))?;
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(s.as_bytes());
    Ok(())
}

/// Bounds-checked cursor over an input buffer.
struct Reader<'a> {
    buffer: &'a [u8],
    offset: usize,
}

impl<'a> Reader<'a> {
    fn new(buffer: &'a [u8]) -> Self {
        Self { buffer, offset: 0 }
    }

    fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    fn take(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        let truncated = CodecError::Truncated {
            offset: self.offset,
            needed: len,
            available: self.remaining(),
        };
        let end = self.offset.checked_add(len).ok_or(truncated.clone())?;
        let slice = self.buffer.get(self.offset..end).ok_or(truncated)?;
        self.offset = end;
        Ok(slice)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.take(N)?);
        Ok(array)
    }

    fn read_u8(&mut self) -> Result<u8, CodecError> {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    fn read_i32(&mut self) -> Result<i32, CodecError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    fn read_str(&mut self) -> Result<String, CodecError> {
        let len = u16::from_be_bytes(self.read_array()?);
        let start = self.offset;
        let bytes = self.take(usize::from(len))?;
        std::str::from_utf8(bytes)
            .map(str::to_string)
            .map_err(|_| CodecError::InvalidUtf8(start))
    }
}
