use crate::tuple::Schema;

use super::IndexMeta;

/// Metadata of one table: its record layout and secondary indexes.
#[derive(Debug, Clone)]
pub struct TableMeta {
    pub name: String,
    pub schema: Schema,
    pub indexes: Vec<IndexMeta>,
}

impl TableMeta {
    pub fn new(name: impl Into<String>, schema: Schema) -> Self {
        Self {
            name: name.into(),
            schema,
            indexes: Vec::new(),
        }
    }

    pub fn record_len(&self) -> usize {
        self.schema.record_len()
    }

    /// Finds the index keyed on exactly these columns.
    pub fn index_on<S: AsRef<str>>(&self, columns: &[S]) -> Option<&IndexMeta> {
        self.indexes.iter().find(|ix| ix.is_on(columns))
    }
}
