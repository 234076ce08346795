use std::fmt;

use bytes::Buf;

use crate::common::{Result, TesseraError};

use super::ColType;

/// A typed literal, as used in predicates, assignments and inserts.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    BigInt(i64),
    Float(f32),
    Str(String),
}

impl Value {
    /// Name of this value's type, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "INT",
            Value::BigInt(_) => "BIGINT",
            Value::Float(_) => "FLOAT",
            Value::Str(_) => "CHAR",
        }
    }

    /// Returns true if this value can be stored in a column of type `ty`.
    pub fn fits(&self, ty: &ColType) -> bool {
        matches!(
            (self, ty),
            (Value::Int(_), ColType::Int)
                | (Value::BigInt(_), ColType::BigInt)
                | (Value::Float(_), ColType::Float)
                | (Value::Str(_), ColType::Char(_))
        )
    }

    /// Encodes the value to the fixed width of `ty`.
    ///
    /// Strings are zero-padded and must not be longer than the column.
    pub fn encode(&self, ty: &ColType) -> Result<Vec<u8>> {
        match (self, ty) {
            (Value::Int(v), ColType::Int) => Ok(v.to_le_bytes().to_vec()),
            (Value::BigInt(v), ColType::BigInt) => Ok(v.to_le_bytes().to_vec()),
            (Value::Float(v), ColType::Float) => Ok(v.to_le_bytes().to_vec()),
            (Value::Str(s), ColType::Char(n)) => {
                let n = *n as usize;
                if s.len() > n {
                    return Err(TesseraError::ValueOverflow(n));
                }
                let mut bytes = s.as_bytes().to_vec();
                bytes.resize(n, 0);
                Ok(bytes)
            }
            _ => Err(TesseraError::TypeMismatch {
                expected: ty.to_string(),
                found: self.type_name().to_string(),
            }),
        }
    }

    /// Decodes an encoding of type `ty`. Trailing zero padding is dropped
    /// from strings.
    pub fn decode(ty: &ColType, data: &[u8]) -> Value {
        let mut buf = &data[..ty.size()];
        match ty {
            ColType::Int => Value::Int(buf.get_i32_le()),
            ColType::BigInt => Value::BigInt(buf.get_i64_le()),
            ColType::Float => Value::Float(buf.get_f32_le()),
            ColType::Char(_) => {
                let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
                Value::Str(String::from_utf8_lossy(&buf[..end]).into_owned())
            }
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::BigInt(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", v),
            Value::Str(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::BigInt(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_int_encoding() {
        let bytes = Value::Int(-7).encode(&ColType::Int).unwrap();
        assert_eq!(bytes, (-7i32).to_le_bytes());
        assert_eq!(Value::decode(&ColType::Int, &bytes), Value::Int(-7));
    }

    #[test]
    fn test_char_padding() {
        let bytes = Value::from("ab").encode(&ColType::Char(4)).unwrap();
        assert_eq!(bytes, b"ab\0\0");
        assert_eq!(Value::decode(&ColType::Char(4), &bytes), Value::from("ab"));
    }

    #[test]
    fn test_char_overflow() {
        assert!(matches!(
            Value::from("toolong").encode(&ColType::Char(3)),
            Err(TesseraError::ValueOverflow(3))
        ));
    }

    #[test]
    fn test_type_mismatch() {
        assert!(!Value::Int(1).fits(&ColType::BigInt));
        assert!(matches!(
            Value::Int(1).encode(&ColType::Float),
            Err(TesseraError::TypeMismatch { .. })
        ));
    }
}
