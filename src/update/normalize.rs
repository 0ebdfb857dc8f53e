use crate::errors::{DocError, Result};
use crate::value::{Map, Value};

use super::types::{UpdateOperation, UpdateOperator};

/// Normalize a raw update operation.
///
/// A map whose first key lacks `$` is a `$set` operand. `$push` and `$addToSet`
/// values without `$each` become `{$each: [value]}`. Operators with a null operand
/// are dropped.
///
/// # Errors
/// `UnknownOperator` for an unrecognized `$` key or a bare key mixed into an
/// operator map; `InvalidOperand` when the operation or an operand is not a map.
pub fn normalize_update_operation(raw: &Value) -> Result<UpdateOperation> {
    let map = raw.as_object().ok_or_else(|| {
        DocError::operand("update operation", format!("expected an object, got {}", raw.type_name()))
    })?;
    let Some(first) = map.keys().next() else {
        return Ok(UpdateOperation::new());
    };
    if !first.starts_with('$') {
        return Ok(operation_from([(UpdateOperator::Set, map.clone())]));
    }
    let mut operators = Vec::with_capacity(map.len());
    for (key, operand) in map {
        let operator = UpdateOperator::try_from(key.as_str())?;
        if operand.is_nullish() {
            continue;
        }
        let operand = operand
            .as_object()
            .ok_or_else(|| DocError::operand(key, "expected a map of document paths"))?;
        operators.push((operator, operand.clone()));
    }
    Ok(operation_from(operators))
}

fn operation_from(operators: impl IntoIterator<Item = (UpdateOperator, Map)>) -> UpdateOperation {
    operators
        .into_iter()
        .map(|(operator, operand)| match operator {
            UpdateOperator::Push | UpdateOperator::AddToSet => {
                (operator, operand.into_iter().map(|(path, v)| (path, each_modifier(v))).collect())
            }
            _ => (operator, operand),
        })
        .collect()
}

/// `$push`/`$addToSet` modifier form of `value`.
pub(crate) fn each_modifier(value: Value) -> Value {
    let has_each = value.as_object().and_then(|m| m.get("$each")).is_some_and(|v| !v.is_nullish());
    if has_each {
        return value;
    }
    let mut m = Map::new();
    m.insert("$each".to_string(), Value::array(vec![value]));
    Value::object(m)
}

impl TryFrom<&Value> for UpdateOperation {
    type Error = DocError;

    fn try_from(raw: &Value) -> Result<Self> {
        normalize_update_operation(raw)
    }
}

/// # Errors
/// Returns an error if the JSON is invalid or does not describe an update operation.
pub fn parse_update_json(json: &str) -> Result<UpdateOperation> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    normalize_update_operation(&Value::from(raw))
}
