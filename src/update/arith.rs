use crate::errors::{DocError, Result};
use crate::num::i64_to_f64;
use crate::value::Value;

use super::types::UpdateOperator;

fn operands(operator: UpdateOperator, a: &Value, b: &Value) -> Result<(f64, f64)> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) if a.is_number() && b.is_number() => Ok((x, y)),
        _ => Err(DocError::operand(operator.as_str(), format!("cannot combine {a} and {b}: not numbers"))),
    }
}

/// `a + b`, integral while it fits in `i64`.
pub(crate) fn add(operator: UpdateOperator, a: &Value, b: &Value) -> Result<Value> {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        return Ok(x.checked_add(*y).map_or_else(|| Value::Double(i64_to_f64(*x) + i64_to_f64(*y)), Value::Int));
    }
    let (x, y) = operands(operator, a, b)?;
    Ok(Value::Double(x + y))
}

/// `a * b`, integral while it fits in `i64`.
pub(crate) fn mul(operator: UpdateOperator, a: &Value, b: &Value) -> Result<Value> {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        return Ok(x.checked_mul(*y).map_or_else(|| Value::Double(i64_to_f64(*x) * i64_to_f64(*y)), Value::Int));
    }
    let (x, y) = operands(operator, a, b)?;
    Ok(Value::Double(x * y))
}

/// Current numeric value at a path; absent counts as zero.
pub(crate) fn current_number(operator: UpdateOperator, path: &str, current: &Value) -> Result<Value> {
    match current {
        Value::Undefined | Value::Null => Ok(Value::Int(0)),
        v if v.is_number() => Ok(v.clone()),
        other => Err(DocError::operand(
            operator.as_str(),
            format!("value at '{path}' is {}, not a number", other.type_name()),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integers_stay_integral_until_overflow() {
        assert_eq!(add(UpdateOperator::Inc, &Value::Int(2), &Value::Int(3)).unwrap(), Value::Int(5));
        assert!(matches!(add(UpdateOperator::Inc, &Value::Int(i64::MAX), &Value::Int(1)).unwrap(), Value::Double(_)));
        assert_eq!(mul(UpdateOperator::Mul, &Value::Int(2), &Value::Double(1.5)).unwrap(), Value::Double(3.0));
    }

    #[test]
    fn non_numbers_are_rejected() {
        assert!(add(UpdateOperator::Inc, &Value::from("a"), &Value::Int(1)).is_err());
        assert!(current_number(UpdateOperator::Inc, "a", &Value::from(true)).is_err());
        assert_eq!(current_number(UpdateOperator::Inc, "a", &Value::Undefined).unwrap(), Value::Int(0));
    }
}
