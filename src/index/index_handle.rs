use std::fmt;

use crate::common::{Result, Rid, Transaction};
use crate::tuple::{ColumnMeta, Record};

/// Secondary index maintenance as seen by the executors.
/// Keys are the concatenated bytes of the index's key columns.
pub trait IndexHandle: Send + Sync {
    /// Adds `key -> rid`. Fails with `DuplicateKey` if the key is present.
    fn insert_entry(&self, key: &[u8], rid: Rid, txn: &Transaction) -> Result<()>;

    /// Removes `key`. Returns false if it was not present.
    fn delete_entry(&self, key: &[u8], txn: &Transaction) -> Result<bool>;

    /// Looks up the record stored under `key`.
    fn get(&self, key: &[u8]) -> Result<Option<Rid>>;
}

/// Identifies one secondary index on a table: its ordered key columns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexMeta {
    pub table: String,
    pub columns: Vec<ColumnMeta>,
    /// Sum of the key columns' widths
    pub key_len: usize,
}

impl IndexMeta {
    pub fn new(table: impl Into<String>, columns: Vec<ColumnMeta>) -> Self {
        let key_len = columns.iter().map(|c| c.len).sum();
        Self {
            table: table.into(),
            columns,
            key_len,
        }
    }

    /// Builds this index's key for a record of its table.
    pub fn key_from(&self, record: &Record) -> Vec<u8> {
        let mut key = Vec::with_capacity(self.key_len);
        for col in &self.columns {
            key.extend_from_slice(record.column(col));
        }
        key
    }

    /// True if the index is keyed on exactly these column names, in order.
    pub fn is_on<S: AsRef<str>>(&self, names: &[S]) -> bool {
        self.columns.len() == names.len()
            && self
                .columns
                .iter()
                .zip(names)
                .all(|(c, n)| c.name == n.as_ref())
    }
}

impl fmt::Display for IndexMeta {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.columns.iter().map(|c| c.name.as_str()).collect();
        write!(f, "{}({})", self.table, names.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{ColType, Schema};

    #[test]
    fn test_key_from_follows_key_order() {
        let schema = Schema::for_table("t", &[("a", ColType::Int), ("b", ColType::Char(2))]);
        let meta = IndexMeta::new(
            "t",
            vec![schema.columns()[1].clone(), schema.columns()[0].clone()],
        );
        assert_eq!(meta.key_len, 6);
        assert!(meta.is_on(&["b", "a"]));
        assert!(!meta.is_on(&["a", "b"]));

        let mut record = Record::zeroed(schema.record_len());
        record.set_column(&schema.columns()[0], &7i32.to_le_bytes());
        record.set_column(&schema.columns()[1], b"hi");

        assert_eq!(meta.key_from(&record), [b'h', b'i', 7, 0, 0, 0]);
        assert_eq!(meta.to_string(), "t(b, a)");
    }
}
