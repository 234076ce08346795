use std::cmp::Ordering;
use std::fmt;

use bytes::Buf;

/// Declared type of a column. Every type has a fixed encoded width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColType {
    /// 32-bit signed integer: 4 bytes, little-endian
    Int,

    /// 64-bit signed integer: 8 bytes, little-endian
    BigInt,

    /// 32-bit floating point: 4 bytes, IEEE 754
    Float,

    /// Fixed-length character string: exactly n bytes, zero-padded
    Char(u16),
}

impl ColType {
    /// Returns the encoded size in bytes.
    pub fn size(&self) -> usize {
        match self {
            ColType::Int => 4,
            ColType::BigInt => 8,
            ColType::Float => 4,
            ColType::Char(n) => *n as usize,
        }
    }

    /// Compares two encodings of this type.
    ///
    /// Integers compare as signed numbers, floats by IEEE total order with
    /// both zeros equal, and characters byte by byte.
    pub fn compare(&self, lhs: &[u8], rhs: &[u8]) -> Ordering {
        match self {
            ColType::Int => (&lhs[..4]).get_i32_le().cmp(&(&rhs[..4]).get_i32_le()),
            ColType::BigInt => (&lhs[..8]).get_i64_le().cmp(&(&rhs[..8]).get_i64_le()),
            ColType::Float => {
                // Adding 0.0 turns -0.0 into 0.0 so the two compare equal
                let l = (&lhs[..4]).get_f32_le() + 0.0;
                let r = (&rhs[..4]).get_f32_le() + 0.0;
                l.total_cmp(&r)
            }
            ColType::Char(n) => {
                let n = *n as usize;
                lhs[..n].cmp(&rhs[..n])
            }
        }
    }

    /// True if values of `other` can be compared with values of this type.
    /// Character columns of different widths are not comparable.
    pub fn is_compatible(&self, other: &ColType) -> bool {
        self == other
    }
}

impl fmt::Display for ColType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColType::Int => write!(f, "INT"),
            ColType::BigInt => write!(f, "BIGINT"),
            ColType::Float => write!(f, "FLOAT"),
            ColType::Char(n) => write!(f, "CHAR({})", n),
        }
    }
}
