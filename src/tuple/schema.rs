use std::fmt;

use crate::common::{Result, TesseraError};

use super::ColType;

/// Reference to a column by name, optionally qualified by its table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ColumnRef {
    pub table: Option<String>,
    pub name: String,
}

impl ColumnRef {
    pub fn new(table: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// An unqualified reference, matching the first column with this name.
    pub fn bare(name: impl Into<String>) -> Self {
        Self {
            table: None,
            name: name.into(),
        }
    }

    fn matches(&self, col: &ColumnMeta) -> bool {
        self.name == col.name && self.table.as_ref().map_or(true, |t| *t == col.table)
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.table {
            Some(table) => write!(f, "{}.{}", table, self.name),
            None => write!(f, "{}", self.name),
        }
    }
}

/// Placement of one column inside a fixed-length record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMeta {
    /// Table the column belongs to
    pub table: String,
    pub name: String,
    pub ty: ColType,
    /// Encoded width in bytes
    pub len: usize,
    /// Byte offset within the record
    pub offset: usize,
}

impl ColumnMeta {
    pub fn new(
        table: impl Into<String>,
        name: impl Into<String>,
        ty: ColType,
        offset: usize,
    ) -> Self {
        Self {
            table: table.into(),
            name: name.into(),
            ty,
            len: ty.size(),
            offset,
        }
    }

    /// Byte range of this column within a record.
    pub fn range(&self) -> std::ops::Range<usize> {
        self.offset..self.offset + self.len
    }
}

/// Ordered column layout of a record stream.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Schema {
    columns: Vec<ColumnMeta>,
    record_len: usize,
}

impl Schema {
    /// Wraps columns whose offsets are already assigned.
    pub fn new(columns: Vec<ColumnMeta>) -> Self {
        let record_len = columns.iter().map(|c| c.offset + c.len).max().unwrap_or(0);
        Self {
            columns,
            record_len,
        }
    }

    /// Lays out a table's columns back to back in declaration order.
    pub fn for_table(table: &str, columns: &[(&str, ColType)]) -> Self {
        let mut offset = 0;
        let columns = columns
            .iter()
            .map(|&(name, ty)| {
                let col = ColumnMeta::new(table, name, ty, offset);
                offset += col.len;
                col
            })
            .collect();
        Self::new(columns)
    }

    pub fn columns(&self) -> &[ColumnMeta] {
        &self.columns
    }

    pub fn column(&self, index: usize) -> Option<&ColumnMeta> {
        self.columns.get(index)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Length in bytes of a record with this layout.
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Position of the first column matching `col`.
    pub fn position(&self, col: &ColumnRef) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| col.matches(c))
            .ok_or_else(|| TesseraError::ColumnNotFound(col.to_string()))
    }

    pub fn resolve(&self, col: &ColumnRef) -> Result<&ColumnMeta> {
        let index = self.position(col)?;
        Ok(&self.columns[index])
    }

    /// The same layout with every column qualified by `table`.
    pub fn renamed(&self, table: &str) -> Schema {
        Schema {
            columns: self
                .columns
                .iter()
                .map(|c| ColumnMeta {
                    table: table.to_string(),
                    ..c.clone()
                })
                .collect(),
            record_len: self.record_len,
        }
    }

    /// Layout of `self` followed by `right`, with the right columns shifted
    /// past the end of a left record.
    pub fn concat(&self, right: &Schema) -> Schema {
        let shift = self.record_len;
        let mut columns = self.columns.clone();
        columns.extend(right.columns.iter().map(|c| ColumnMeta {
            offset: c.offset + shift,
            ..c.clone()
        }));
        Schema {
            columns,
            record_len: self.record_len + right.record_len,
        }
    }

    /// Packs the selected columns back to back, in the requested order.
    /// Returns the positions of the selected columns in `self` together with
    /// the packed layout.
    pub fn project(&self, cols: &[ColumnRef]) -> Result<(Vec<usize>, Schema)> {
        let mut positions = Vec::with_capacity(cols.len());
        let mut columns = Vec::with_capacity(cols.len());
        let mut offset = 0;

        for col in cols {
            let pos = self.position(col)?;
            let src = &self.columns[pos];
            columns.push(ColumnMeta {
                offset,
                ..src.clone()
            });
            offset += src.len;
            positions.push(pos);
        }

        Ok((positions, Schema::new(columns)))
    }
}
