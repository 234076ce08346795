use std::cmp::Ordering;
use std::fmt;

use crate::common::{Result, TesseraError};
use crate::tuple::{ColumnMeta, ColumnRef, Schema, Value};

/// Comparison operator of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
}

impl CompOp {
    /// True if a comparison with this outcome satisfies the operator.
    pub fn holds(&self, ord: Ordering) -> bool {
        match self {
            CompOp::Eq => ord == Ordering::Equal,
            CompOp::Ne => ord != Ordering::Equal,
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Le => ord != Ordering::Greater,
            CompOp::Ge => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CompOp::Eq => "=",
            CompOp::Ne => "<>",
            CompOp::Lt => "<",
            CompOp::Gt => ">",
            CompOp::Le => "<=",
            CompOp::Ge => ">=",
        };
        write!(f, "{}", s)
    }
}

/// Right-hand side of a predicate.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Column(ColumnRef),
    Value(Value),
}

/// `lhs op rhs`, where `lhs` is always a column.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub lhs: ColumnRef,
    pub op: CompOp,
    pub rhs: Operand,
}

impl Condition {
    pub fn new(lhs: ColumnRef, op: CompOp, rhs: Operand) -> Self {
        Self { lhs, op, rhs }
    }

    /// `lhs op literal`
    pub fn with_value(lhs: ColumnRef, op: CompOp, value: impl Into<Value>) -> Self {
        Self::new(lhs, op, Operand::Value(value.into()))
    }

    /// `lhs op other_column`
    pub fn with_column(lhs: ColumnRef, op: CompOp, rhs: ColumnRef) -> Self {
        Self::new(lhs, op, Operand::Column(rhs))
    }

    /// Evaluates the predicate. Columns are resolved against `schema` and
    /// their bytes fetched through `bytes_of`.
    pub fn eval<'a, F>(&self, schema: &Schema, bytes_of: F) -> Result<bool>
    where
        F: Fn(&ColumnMeta) -> &'a [u8],
    {
        let lhs = schema.resolve(&self.lhs)?;
        let lhs_bytes = bytes_of(lhs);

        let ord = match &self.rhs {
            Operand::Value(value) => {
                let encoded = value.encode(&lhs.ty)?;
                lhs.ty.compare(lhs_bytes, &encoded)
            }
            Operand::Column(col) => {
                let rhs = schema.resolve(col)?;
                if !lhs.ty.is_compatible(&rhs.ty) {
                    return Err(TesseraError::TypeMismatch {
                        expected: lhs.ty.to_string(),
                        found: rhs.ty.to_string(),
                    });
                }
                lhs.ty.compare(lhs_bytes, bytes_of(rhs))
            }
        };

        Ok(self.op.holds(ord))
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.rhs {
            Operand::Column(col) => write!(f, "{} {} {}", self.lhs, self.op, col),
            Operand::Value(value) => write!(f, "{} {} {}", self.lhs, self.op, value),
        }
    }
}

/// Evaluates a conjunction of predicates.
pub(crate) fn eval_all<'a, F>(conds: &[Condition], schema: &Schema, bytes_of: F) -> Result<bool>
where
    F: Fn(&ColumnMeta) -> &'a [u8] + Copy,
{
    for cond in conds {
        if !cond.eval(schema, bytes_of)? {
            return Ok(false);
        }
    }
    Ok(true)
}

/// `column = value` assignment of an update.
#[derive(Debug, Clone, PartialEq)]
pub struct SetClause {
    pub column: ColumnRef,
    pub value: Value,
}

impl SetClause {
    pub fn new(column: ColumnRef, value: impl Into<Value>) -> Self {
        Self {
            column,
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuple::{ColType, Record};

    fn sample() -> (Schema, Record) {
        let schema = Schema::for_table(
            "t",
            &[("a", ColType::Int), ("b", ColType::Int), ("s", ColType::Char(4))],
        );
        let mut record = Record::zeroed(schema.record_len());
        record.set_column(&schema.columns()[0], &(-3i32).to_le_bytes());
        record.set_column(&schema.columns()[1], &7i32.to_le_bytes());
        record.set_column(&schema.columns()[2], b"abc\0");
        (schema, record)
    }

    #[test]
    fn test_comp_op() {
        assert!(CompOp::Le.holds(Ordering::Equal));
        assert!(!CompOp::Lt.holds(Ordering::Equal));
        assert!(CompOp::Ne.holds(Ordering::Greater));
        assert_eq!(CompOp::Ne.to_string(), "<>");
    }

    #[test]
    fn test_eval_literal_and_column() {
        let (schema, record) = sample();
        let bytes_of = |c: &ColumnMeta| record.column(c);

        let lt = Condition::with_value(ColumnRef::bare("a"), CompOp::Lt, 0i32);
        assert!(lt.eval(&schema, bytes_of).unwrap());

        let cols = Condition::with_column(ColumnRef::bare("a"), CompOp::Ge, ColumnRef::bare("b"));
        assert!(!cols.eval(&schema, bytes_of).unwrap());

        let s = Condition::with_value(ColumnRef::bare("s"), CompOp::Eq, "abc");
        assert!(s.eval(&schema, bytes_of).unwrap());
    }

    #[test]
    fn test_eval_errors() {
        let (schema, record) = sample();
        let bytes_of = |c: &ColumnMeta| record.column(c);

        let missing = Condition::with_value(ColumnRef::bare("zz"), CompOp::Eq, 1i32);
        assert!(matches!(
            missing.eval(&schema, bytes_of),
            Err(TesseraError::ColumnNotFound(_))
        ));

        let mixed = Condition::with_column(ColumnRef::bare("a"), CompOp::Eq, ColumnRef::bare("s"));
        assert!(matches!(
            mixed.eval(&schema, bytes_of),
            Err(TesseraError::TypeMismatch { .. })
        ));

        let literal = Condition::with_value(ColumnRef::bare("a"), CompOp::Eq, "x");
        assert!(matches!(
            literal.eval(&schema, bytes_of),
            Err(TesseraError::TypeMismatch { .. })
        ));
    }
}
