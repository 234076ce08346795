use crate::common::{Result, TesseraError};
use crate::tuple::{ColumnMeta, Record, Schema};

use super::condition::eval_all;
use super::{Condition, Executor};

/// Cross product of two children filtered by join conditions.
///
/// The left child is the outer loop. The right child is re-opened once for
/// every left tuple. Output records are the left record followed by the
/// right record.
pub struct NestedLoopJoinExecutor {
    left: Box<dyn Executor>,
    right: Box<dyn Executor>,
    conds: Vec<Condition>,
    schema: Schema,
    /// Record length of the left child; joined offsets below it are left
    /// columns
    left_len: usize,
    finished: bool,
}

impl NestedLoopJoinExecutor {
    pub fn new(left: Box<dyn Executor>, right: Box<dyn Executor>, conds: Vec<Condition>) -> Self {
        let schema = left.schema().concat(right.schema());
        let left_len = left.record_len();
        Self {
            left,
            right,
            conds,
            schema,
            left_len,
            finished: true,
        }
    }

    /// Bytes of a joined column, taken from whichever side it belongs to.
    fn side_bytes<'a>(
        col: &ColumnMeta,
        left: &'a Record,
        right: &'a Record,
        left_len: usize,
    ) -> &'a [u8] {
        if col.offset < left_len {
            left.column(col)
        } else {
            let start = col.offset - left_len;
            &right.data()[start..start + col.len]
        }
    }

    fn current_pair(&self) -> Result<(Record, Record)> {
        match (self.left.materialize()?, self.right.materialize()?) {
            (Some(l), Some(r)) => Ok((l, r)),
            _ => Err(TesseraError::Internal(
                "join child produced no tuple before reaching its end".into(),
            )),
        }
    }

    /// Moves forward from the current pair to the first pair that satisfies
    /// every condition, rewinding the right child each time the left one
    /// advances.
    fn seek_match(&mut self) -> Result<()> {
        loop {
            if self.left.done() {
                self.finished = true;
                return Ok(());
            }
            if self.right.done() {
                self.left.advance()?;
                if self.left.done() {
                    self.finished = true;
                    return Ok(());
                }
                self.right.open()?;
                if self.right.done() {
                    self.finished = true;
                    return Ok(());
                }
                continue;
            }

            let (l, r) = self.current_pair()?;
            let left_len = self.left_len;
            let matched = eval_all(&self.conds, &self.schema, |c: &ColumnMeta| {
                Self::side_bytes(c, &l, &r, left_len)
            })?;
            if matched {
                return Ok(());
            }
            self.right.advance()?;
        }
    }
}

impl Executor for NestedLoopJoinExecutor {
    fn open(&mut self) -> Result<()> {
        self.left.open()?;
        self.right.open()?;
        self.finished = self.left.done() || self.right.done();
        if !self.finished {
            self.seek_match()?;
        }
        Ok(())
    }

    fn advance(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.right.advance()?;
        self.seek_match()
    }

    fn materialize(&self) -> Result<Option<Record>> {
        if self.finished {
            return Ok(None);
        }
        let (l, r) = self.current_pair()?;
        Ok(Some(Record::concat(&l, &r)))
    }

    fn done(&self) -> bool {
        self.finished
    }

    fn schema(&self) -> &Schema {
        &self.schema
    }

    fn name(&self) -> &'static str {
        "NestedLoopJoinExecutor"
    }
}
