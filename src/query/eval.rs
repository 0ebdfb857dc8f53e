use std::cmp::Ordering;

use crate::errors::{DocError, Result};
use crate::value::Value;

use super::retrieve::classify_by_complex_find_operation;
use super::types::{Clause, CmpOp, QueryCondition, bson_type_of};

impl QueryCondition {
    /// Whether `value` satisfies every clause. Evaluation stops at the first failing clause.
    ///
    /// # Errors
    /// `UnsupportedOperator` when an unimplemented operator is reached.
    pub fn matches(&self, value: &Value) -> Result<bool> {
        for clause in &self.clauses {
            if !clause.matches(value)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

impl Clause {
    fn matches(&self, value: &Value) -> Result<bool> {
        Ok(match self {
            Self::Compare(op, operand) => compare(*op, value, operand),
            Self::In(candidates) => is_in(value, candidates),
            Self::Nin(candidates) => !is_in(value, candidates),
            Self::Not(inner) => !inner.matches(value)?,
            Self::Exists(flag) => !value.is_nullish() == *flag,
            Self::Type(t) => bson_type_of(value) == *t,
            Self::Mod { divisor, remainder } => {
                value.as_f64().is_some_and(|v| v % divisor == *remainder)
            }
            Self::Regex { regex, .. } => match value {
                Value::Array(items) => items
                    .iter()
                    .any(|item| item.scalar_text().is_some_and(|s| regex.is_match(&s))),
                other => other.scalar_text().is_some_and(|s| regex.is_match(&s)),
            },
            Self::Options(_) => true,
            Self::All(required) => value
                .as_array()
                .is_some_and(|items| required.iter().all(|r| items.contains(r))),
            Self::ElemMatch(op) => match value {
                Value::Array(items) => {
                    !classify_by_complex_find_operation(items.iter().collect::<Vec<_>>(), op)?
                        .matched
                        .is_empty()
                }
                _ => false,
            },
            Self::Size(n) => value.as_array().is_some_and(|items| items.len() == *n),
            Self::Unsupported(op) => return Err(DocError::UnsupportedOperator(op.clone())),
        })
    }
}

/// Comparison with array-element semantics: an array target matched against a
/// non-array operand succeeds when some element does (`$ne` when none is equal).
pub(crate) fn compare(op: CmpOp, target: &Value, operand: &Value) -> bool {
    match target {
        Value::Array(items) if !matches!(operand, Value::Array(_)) => match op {
            CmpOp::Ne => !items.iter().any(|item| item == operand),
            _ => items.iter().any(|item| compare_scalar(op, item, operand)),
        },
        _ => compare_scalar(op, target, operand),
    }
}

fn compare_scalar(op: CmpOp, target: &Value, operand: &Value) -> bool {
    match op {
        CmpOp::Eq => target == operand,
        CmpOp::Ne => target != operand,
        CmpOp::Gt => target.compare(operand) == Some(Ordering::Greater),
        CmpOp::Gte => matches!(target.compare(operand), Some(Ordering::Greater | Ordering::Equal)),
        CmpOp::Lt => target.compare(operand) == Some(Ordering::Less),
        CmpOp::Lte => matches!(target.compare(operand), Some(Ordering::Less | Ordering::Equal)),
    }
}

fn is_in(target: &Value, candidates: &[Value]) -> bool {
    match target {
        Value::Array(_) => candidates.iter().any(|c| compare(CmpOp::Eq, target, c)),
        _ => candidates.contains(target),
    }
}

/// Match one value against a raw condition, normalizing it first.
///
/// # Errors
/// Fails on unknown operators, invalid operands, or unsupported operators.
pub fn check_condition(value: &Value, condition: &Value) -> Result<bool> {
    QueryCondition::try_from(condition)?.matches(value)
}
