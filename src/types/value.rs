use std::{cmp::Ordering, fmt};

use serde::{Deserialize, Serialize};

use crate::types::error::DatabaseError;

pub const TAG_NULL: u8 = 0;
pub const TAG_INTEGER: u8 = 1;
pub const TAG_REAL: u8 = 2;
pub const TAG_TEXT: u8 = 3;
pub const TAG_BLOB: u8 = 4;

/// Storage class of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Real,
    Text,
    Blob,
}

impl DataType {
    /// Resolve a declared column type name (`VARCHAR(20)`, `BIGINT`, `DOUBLE`...)
    /// the way SQLite assigns column affinity.
    pub fn from_declared(type_name: &str) -> Option<Self> {
        let upper = type_name.to_ascii_uppercase();
        if upper.contains("INT") {
            Some(DataType::Integer)
        } else if upper.contains("CHAR") || upper.contains("CLOB") || upper.contains("TEXT") {
            Some(DataType::Text)
        } else if upper.contains("BLOB") {
            Some(DataType::Blob)
        } else if upper.contains("REAL") || upper.contains("FLOA") || upper.contains("DOUB") {
            Some(DataType::Real)
        } else if upper.contains("BOOL") {
            Some(DataType::Integer)
        } else {
            None
        }
    }

    pub fn tag(&self) -> u8 {
        match self {
            DataType::Integer => TAG_INTEGER,
            DataType::Real => TAG_REAL,
            DataType::Text => TAG_TEXT,
            DataType::Blob => TAG_BLOB,
        }
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DataType::Integer => "INTEGER",
            DataType::Real => "REAL",
            DataType::Text => "TEXT",
            DataType::Blob => "BLOB",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Value {
    /// `None` for NULL, which has no storage class of its own.
    pub fn data_type(&self) -> Option<DataType> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(DataType::Integer),
            Value::Real(_) => Some(DataType::Real),
            Value::Text(_) => Some(DataType::Text),
            Value::Blob(_) => Some(DataType::Blob),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "NULL",
            Value::Integer(_) => "INTEGER",
            Value::Real(_) => "REAL",
            Value::Text(_) => "TEXT",
            Value::Blob(_) => "BLOB",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn tag(&self) -> u8 {
        match self {
            Value::Null => TAG_NULL,
            Value::Integer(_) => TAG_INTEGER,
            Value::Real(_) => TAG_REAL,
            Value::Text(_) => TAG_TEXT,
            Value::Blob(_) => TAG_BLOB,
        }
    }

    /// Convert the value into the storage class of a column.
    /// Returns `None` when the value cannot be stored there without loss.
    pub fn coerce_to(&self, data_type: DataType) -> Option<Value> {
        match (self, data_type) {
            (Value::Null, _) => Some(Value::Null),
            (Value::Integer(i), DataType::Integer) => Some(Value::Integer(*i)),
            (Value::Integer(i), DataType::Real) => Some(Value::Real(*i as f64)),
            (Value::Real(r), DataType::Real) => Some(Value::Real(*r)),
            (Value::Real(r), DataType::Integer) => {
                if r.fract() == 0.0 && *r >= i64::MIN as f64 && *r < i64::MAX as f64 {
                    Some(Value::Integer(*r as i64))
                } else {
                    None
                }
            }
            (Value::Text(s), DataType::Text) => Some(Value::Text(s.clone())),
            (Value::Blob(b), DataType::Blob) => Some(Value::Blob(b.clone())),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Real(r) => Some(*r),
            _ => None,
        }
    }

    /// SQL comparison: NULL and mixed storage classes are incomparable,
    /// integers and reals compare numerically.
    pub fn sql_cmp(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Null, _) | (_, Value::Null) => None,
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Real(b)) => (*a as f64).partial_cmp(b),
            (Value::Real(a), Value::Integer(b)) => a.partial_cmp(&(*b as f64)),
            (Value::Real(a), Value::Real(b)) => a.partial_cmp(b),
            (Value::Text(a), Value::Text(b)) => Some(a.cmp(b)),
            (Value::Blob(a), Value::Blob(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    pub fn serialized_size(&self) -> usize {
        match self {
            Value::Null => 1,
            Value::Integer(_) | Value::Real(_) => 1 + 8,
            Value::Text(s) => 1 + 4 + s.len(),
            Value::Blob(b) => 1 + 4 + b.len(),
        }
    }

    /// Tag-length-value encoding: 1-byte tag, then 8 bytes for integer/real or
    /// a 4-byte length prefix and payload for text/blob. Little-endian.
    pub fn write_to(&self, buffer: &mut Vec<u8>) {
        buffer.push(self.tag());
        match self {
            Value::Null => {}
            Value::Integer(i) => buffer.extend_from_slice(&i.to_le_bytes()),
            Value::Real(r) => buffer.extend_from_slice(&r.to_le_bytes()),
            Value::Text(s) => {
                buffer.extend_from_slice(&(s.len() as u32).to_le_bytes());
                buffer.extend_from_slice(s.as_bytes());
            }
            Value::Blob(b) => {
                buffer.extend_from_slice(&(b.len() as u32).to_le_bytes());
                buffer.extend_from_slice(b);
            }
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(self.serialized_size());
        self.write_to(&mut buffer);
        buffer
    }

    /// Decode one value from the front of `bytes`, returning it together with
    /// the number of bytes consumed.
    pub fn from_bytes(bytes: &[u8]) -> Result<(Self, usize), DatabaseError> {
        let Some(&tag) = bytes.first() else {
            return Err(DatabaseError::SerializationError {
                details: "Empty value bytes".to_string(),
            });
        };

        match tag {
            TAG_NULL => Ok((Value::Null, 1)),
            TAG_INTEGER => {
                let raw = read_fixed8(bytes, "integer")?;
                Ok((Value::Integer(i64::from_le_bytes(raw)), 9))
            }
            TAG_REAL => {
                let raw = read_fixed8(bytes, "real")?;
                Ok((Value::Real(f64::from_le_bytes(raw)), 9))
            }
            TAG_TEXT => {
                let payload = read_prefixed(bytes, "text")?;
                let text = String::from_utf8(payload.to_vec()).map_err(|_| {
                    DatabaseError::SerializationError {
                        details: "Invalid UTF-8 in text value".to_string(),
                    }
                })?;
                Ok((Value::Text(text), 1 + 4 + payload.len()))
            }
            TAG_BLOB => {
                let payload = read_prefixed(bytes, "blob")?;
                Ok((Value::Blob(payload.to_vec()), 1 + 4 + payload.len()))
            }
            other => Err(DatabaseError::SerializationError {
                details: format!("Unknown type tag: {}", other),
            }),
        }
    }
}

fn read_fixed8(bytes: &[u8], what: &str) -> Result<[u8; 8], DatabaseError> {
    bytes
        .get(1..9)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| DatabaseError::SerializationError {
            details: format!("Incomplete {} value", what),
        })
}

fn read_prefixed<'a>(bytes: &'a [u8], what: &str) -> Result<&'a [u8], DatabaseError> {
    let length: [u8; 4] = bytes
        .get(1..5)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| DatabaseError::SerializationError {
            details: format!("Incomplete {} length", what),
        })?;
    let length = u32::from_le_bytes(length) as usize;
    bytes
        .get(5..5 + length)
        .ok_or_else(|| DatabaseError::SerializationError {
            details: format!(
                "Insufficient bytes for {} value: expected {}, got {}",
                what,
                length,
                bytes.len().saturating_sub(5)
            ),
        })
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Real(r) => write!(f, "{:?}", r),
            Value::Text(s) => f.write_str(s),
            Value::Blob(b) => {
                f.write_str("x'")?;
                for byte in b {
                    write!(f, "{:02x}", byte)?;
                }
                f.write_str("'")
            }
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Value::Integer(v.into())
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Integer(v.into())
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Real(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Text(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Vec<u8>> for Value {
    fn from(v: Vec<u8>) -> Self {
        Value::Blob(v)
    }
}

impl From<&[u8]> for Value {
    fn from(v: &[u8]) -> Self {
        Value::Blob(v.to_vec())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Builds a positional argument list for [`Database::execute`](crate::Database::execute).
///
/// Usage: `params![1, "Ann", 2.5, None::<i64>]`
#[macro_export]
macro_rules! params {
    ($($val:expr),* $(,)?) => {
        &[$($crate::Value::from($val)),*][..]
    };
}
