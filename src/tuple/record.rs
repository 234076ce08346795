use super::{ColumnMeta, Value};

/// One row's fixed-length encoding.
///
/// A record is an owned buffer; every read from storage and every operator
/// output is a fresh copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    data: Box<[u8]>,
}

impl Record {
    /// A zero-filled record of `len` bytes.
    pub fn zeroed(len: usize) -> Self {
        Self {
            data: vec![0u8; len].into_boxed_slice(),
        }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes of one column.
    pub fn column(&self, col: &ColumnMeta) -> &[u8] {
        &self.data[col.range()]
    }

    /// Overwrites one column. `bytes` must be exactly the column's width.
    pub fn set_column(&mut self, col: &ColumnMeta, bytes: &[u8]) {
        self.data[col.range()].copy_from_slice(bytes);
    }

    /// Decodes one column.
    pub fn value(&self, col: &ColumnMeta) -> Value {
        Value::decode(&col.ty, self.column(col))
    }

    /// A record holding `left` followed by `right`.
    pub fn concat(left: &Record, right: &Record) -> Record {
        let mut data = Vec::with_capacity(left.len() + right.len());
        data.extend_from_slice(&left.data);
        data.extend_from_slice(&right.data);
        Record::from(data)
    }
}

impl From<&[u8]> for Record {
    fn from(bytes: &[u8]) -> Self {
        Self { data: bytes.into() }
    }
}

impl From<Vec<u8>> for Record {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            data: bytes.into_boxed_slice(),
        }
    }
}
