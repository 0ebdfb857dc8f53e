//! Folding several update operations into one.

use std::cmp::Ordering;

use crate::errors::{DocError, Result};
use crate::query::is_query_condition;
use crate::value::{Map, Value};

use super::arith;
use super::types::{Operand, UpdateOperation, UpdateOperator};

/// Merge operations left to right.
///
/// Per path: `$push`/`$addToSet` concatenate `$each` (other modifiers come from the
/// first operand), `$inc` sums, `$mul` multiplies, `$min`/`$max` keep the extreme,
/// `$pull` unions `$eq`/`$in` conditions and joins document conditions under `$or`.
/// Every other operator is last-write-wins.
///
/// # Errors
/// `InvalidOperand` when numeric operands cannot be combined.
pub fn merge_update_operations(operations: &[UpdateOperation]) -> Result<UpdateOperation> {
    let mut merged = UpdateOperation::new();
    for operation in operations {
        for (operator, operand) in operation.iter() {
            match merged.operators.get_mut(&operator) {
                None => {
                    merged.operators.insert(operator, operand.clone());
                }
                Some(acc) => merge_operand(operator, acc, operand)?,
            }
        }
    }
    Ok(merged)
}

/// Parse each raw operation and merge them.
///
/// # Errors
/// Normalization errors, or `InvalidOperand` from [`merge_update_operations`].
pub fn merge_raw_update_operations(raw: &[Value]) -> Result<UpdateOperation> {
    let operations = raw.iter().map(UpdateOperation::try_from).collect::<Result<Vec<_>>>()?;
    merge_update_operations(&operations)
}

fn merge_operand(operator: UpdateOperator, acc: &mut Operand, operand: &Operand) -> Result<()> {
    for (path, value) in operand {
        let Some(prev) = acc.get(path) else {
            acc.insert(path.clone(), value.clone());
            continue;
        };
        let combined = match operator {
            UpdateOperator::Push | UpdateOperator::AddToSet => concat_each(prev, value),
            UpdateOperator::Inc => arith::add(operator, prev, value)?,
            UpdateOperator::Mul => arith::mul(operator, prev, value)?,
            UpdateOperator::Min => extreme(operator, prev, value, Ordering::Less)?,
            UpdateOperator::Max => extreme(operator, prev, value, Ordering::Greater)?,
            UpdateOperator::Pull => merge_pull(path, prev, value),
            _ => value.clone(),
        };
        acc.insert(path.clone(), combined);
    }
    Ok(())
}

fn concat_each(prev: &Value, next: &Value) -> Value {
    let each_of = |v: &Value| v.as_map().and_then(|m| m.get("$each")).and_then(Value::as_array).map(<[Value]>::to_vec);
    let mut modifier = prev.as_map().cloned().unwrap_or_default();
    let mut each = each_of(prev).unwrap_or_default();
    each.extend(each_of(next).unwrap_or_default());
    modifier.insert("$each".to_string(), Value::array(each));
    Value::object(modifier)
}

fn extreme(operator: UpdateOperator, prev: &Value, next: &Value, keep: Ordering) -> Result<Value> {
    match next.compare(prev) {
        Some(ord) if ord == keep => Ok(next.clone()),
        Some(_) => Ok(prev.clone()),
        None => Err(DocError::operand(operator.as_str(), format!("cannot compare {prev} and {next}"))),
    }
}

enum PullShape {
    Eq(Value),
    In(Vec<Value>),
    /// Document conditions, any of which removes an element.
    AnyOf(Vec<Value>),
}

fn pull_shape(condition: &Value) -> Option<PullShape> {
    match condition {
        Value::Object(m) if !m.is_empty() && !is_query_condition(condition) => {
            Some(PullShape::AnyOf(vec![condition.clone()]))
        }
        Value::Object(m) if m.len() == 1 => match m.get_index(0) {
            Some((k, v)) if k == "$eq" => Some(PullShape::Eq(v.clone())),
            Some((k, v)) if k == "$in" => v.as_array().map(|vs| PullShape::In(vs.to_vec())),
            Some((k, v)) if k == "$or" => v.as_array().map(|vs| PullShape::AnyOf(vs.to_vec())),
            _ => None,
        },
        Value::Object(_) | Value::Instance(_) | Value::Regex(_) | Value::Constructor(_) => None,
        Value::Undefined => Some(PullShape::Eq(Value::Null)),
        other => Some(PullShape::Eq(other.clone())),
    }
}

fn single(key: &str, values: Vec<Value>) -> Value {
    let mut m = Map::new();
    m.insert(key.to_string(), Value::array(values));
    Value::object(m)
}

fn union(mut a: Vec<Value>, b: Vec<Value>) -> Vec<Value> {
    for v in b {
        if !a.contains(&v) {
            a.push(v);
        }
    }
    a
}

fn merge_pull(path: &str, prev: &Value, next: &Value) -> Value {
    match (pull_shape(prev), pull_shape(next)) {
        (Some(PullShape::Eq(a)), Some(PullShape::Eq(b))) => {
            if a == b {
                next.clone()
            } else {
                single("$in", vec![a, b])
            }
        }
        (Some(PullShape::In(a)), Some(PullShape::In(b))) => single("$in", union(a, b)),
        (Some(PullShape::In(a)), Some(PullShape::Eq(b))) => {
            if a.contains(&b) {
                prev.clone()
            } else {
                single("$in", union(a, vec![b]))
            }
        }
        (Some(PullShape::Eq(a)), Some(PullShape::In(b))) => {
            if b.contains(&a) {
                next.clone()
            } else {
                single("$in", union(vec![a], b))
            }
        }
        (Some(PullShape::AnyOf(a)), Some(PullShape::AnyOf(b))) => single("$or", union(a, b)),
        _ => {
            log::warn!("$pull conditions on '{path}' cannot be merged; keeping {prev}, dropping {next}");
            prev.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn merge(ops: serde_json::Value) -> Value {
        let raw = match Value::from(ops) {
            Value::Array(items) => items.to_vec(),
            other => vec![other],
        };
        merge_raw_update_operations(&raw).unwrap().to_value()
    }

    #[test]
    fn numeric_operators_combine() {
        assert_eq!(
            merge(json!([{"$inc": {"a": 1}}, {"$inc": {"a": 2, "b": 1}}])),
            Value::from(json!({"$inc": {"a": 3, "b": 1}}))
        );
        assert_eq!(merge(json!([{"$mul": {"a": 2}}, {"$mul": {"a": 5}}])), Value::from(json!({"$mul": {"a": 10}})));
        assert_eq!(merge(json!([{"$min": {"a": 2}}, {"$min": {"a": 5}}])), Value::from(json!({"$min": {"a": 2}})));
        assert_eq!(merge(json!([{"$max": {"a": 2}}, {"$max": {"a": 5}}])), Value::from(json!({"$max": {"a": 5}})));
    }

    #[test]
    fn set_is_last_write_wins() {
        assert_eq!(
            merge(json!([{"a": 1, "c": 0}, {"$set": {"a": 2}}, {"$unset": {"b": ""}}])),
            Value::from(json!({"$set": {"a": 2, "c": 0}, "$unset": {"b": ""}}))
        );
    }

    #[test]
    fn push_concatenates_each() {
        assert_eq!(
            merge(json!([{"$push": {"a": {"$each": [1], "$slice": 3}}}, {"$push": {"a": 2}}])),
            Value::from(json!({"$push": {"a": {"$each": [1, 2], "$slice": 3}}}))
        );
    }

    #[test]
    fn pull_conditions_union() {
        assert_eq!(
            merge(json!([{"$pull": {"a": {"$eq": "1"}}}, {"$pull": {"a": {"$eq": "2"}}}])),
            Value::from(json!({"$pull": {"a": {"$in": ["1", "2"]}}}))
        );
        assert_eq!(
            merge(json!([{"$pull": {"a": "1"}}, {"$pull": {"a": {"$eq": "1"}}}])),
            Value::from(json!({"$pull": {"a": {"$eq": "1"}}}))
        );
        assert_eq!(
            merge(json!([{"$pull": {"a": {"$in": [1, 2]}}}, {"$pull": {"a": {"$in": [2, 3]}}}])),
            Value::from(json!({"$pull": {"a": {"$in": [1, 2, 3]}}}))
        );
        assert_eq!(
            merge(json!([{"$pull": {"a": {"$in": [1]}}}, {"$pull": {"a": 2}}])),
            Value::from(json!({"$pull": {"a": {"$in": [1, 2]}}}))
        );
        assert_eq!(
            merge(json!([{"$pull": {"a": 0}}, {"$pull": {"a": {"$in": [1]}}}])),
            Value::from(json!({"$pull": {"a": {"$in": [0, 1]}}}))
        );
        assert_eq!(
            merge(json!([{"$pull": {"a": {"$gt": 1}}}, {"$pull": {"a": 0}}])),
            Value::from(json!({"$pull": {"a": {"$gt": 1}}}))
        );
    }

    #[test]
    fn document_pull_conditions_join_under_or() {
        let first = json!({"$pull": {"items": {"k": 1}}});
        let second = json!({"$pull": {"items": {"k": 2}}});
        let merged = merge(json!([first.clone(), second.clone()]));
        assert_eq!(merged, Value::from(json!({"$pull": {"items": {"$or": [{"k": 1}, {"k": 2}]}}})));

        let doc = Value::from(json!({"items": [{"k": 1}, {"k": 2, "x": 1}, {"k": 3, "x": 0}]}));
        let op = |j: serde_json::Value| UpdateOperation::try_from(&Value::from(j)).unwrap();
        let sequential = crate::update::update(&doc, &[op(first), op(second)]).unwrap();
        let at_once = crate::update::update(&doc, &[UpdateOperation::try_from(&merged).unwrap()]).unwrap();
        assert_eq!(at_once, sequential);
        assert_eq!(at_once, Value::from(json!({"items": [{"k": 3, "x": 0}]})));
    }

    #[test]
    fn scalar_and_document_pull_keep_the_first() {
        assert_eq!(
            merge(json!([{"$pull": {"a": 1}}, {"$pull": {"a": {"k": 1}}}])),
            Value::from(json!({"$pull": {"a": 1}}))
        );
    }

    #[test]
    fn incompatible_numbers_fail() {
        let raw = [Value::from(json!({"$inc": {"a": 1}})), Value::from(json!({"$inc": {"a": "x"}}))];
        assert!(matches!(merge_raw_update_operations(&raw), Err(DocError::InvalidOperand { .. })));
    }
}
