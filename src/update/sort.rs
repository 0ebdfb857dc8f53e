use std::cmp::Ordering;

use ordered_float::OrderedFloat;

use crate::errors::{DocError, Result};
use crate::num::cmp_i64_f64;
use crate::path::{Attribute, get_by_attributes, parse_document_path};
use crate::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Asc,
    Desc,
}

fn direction(v: &Value) -> Result<Direction> {
    match v.as_i64() {
        Some(1) => Ok(Direction::Asc),
        Some(-1) => Ok(Direction::Desc),
        _ => Err(DocError::operand("$sort", format!("direction must be 1 or -1, got {v}"))),
    }
}

fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Undefined => 0,
        Value::Null => 1,
        Value::Int(_) | Value::Double(_) => 2,
        Value::String(_) => 3,
        Value::Object(_) | Value::Instance(_) => 4,
        Value::Array(_) => 5,
        Value::Bool(_) => 6,
        Value::Date(_) => 7,
        Value::Regex(_) => 8,
        Value::Constructor(_) => 9,
    }
}

/// Total order used by `$sort`: type rank first, then value. Containers of the
/// same rank tie.
fn total_cmp(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Double(x), Value::Double(y)) => OrderedFloat(*x).cmp(&OrderedFloat(*y)),
        (Value::Int(x), Value::Double(y)) => cmp_i64_f64(*x, *y),
        (Value::Double(x), Value::Int(y)) => cmp_i64_f64(*y, *x).reverse(),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Date(x), Value::Date(y)) => x.cmp(y),
        (Value::Regex(x), Value::Regex(y)) => x.pattern().cmp(y.pattern()),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

fn directed(ord: Ordering, dir: Direction) -> Ordering {
    match dir {
        Direction::Asc => ord,
        Direction::Desc => ord.reverse(),
    }
}

/// Stable sort of `values` by a `$sort` notation: `1`, `-1`, or a map of document
/// paths to directions compared in key order.
///
/// # Errors
/// `InvalidOperand` for a direction other than `1`/`-1` or a notation of another
/// shape; `MalformedPath` for a bad key.
pub fn sort_by_notation(values: &[Value], notation: &Value) -> Result<Vec<Value>> {
    let mut sorted = values.to_vec();
    if let Some(map) = notation.as_object() {
        let keys = map
            .iter()
            .map(|(path, dir)| Ok((parse_document_path(path)?, direction(dir)?)))
            .collect::<Result<Vec<(Vec<Attribute>, Direction)>>>()?;
        sorted.sort_by(|a, b| {
            keys.iter()
                .map(|(attrs, dir)| {
                    directed(total_cmp(get_by_attributes(a, attrs), get_by_attributes(b, attrs)), *dir)
                })
                .find(|ord| ord.is_ne())
                .unwrap_or(Ordering::Equal)
        });
    } else {
        let dir = direction(notation)?;
        sorted.sort_by(|a, b| directed(total_cmp(a, b), dir));
    }
    Ok(sorted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn arr(j: serde_json::Value) -> Vec<Value> {
        match Value::from(j) {
            Value::Array(items) => items.to_vec(),
            _ => unreachable!(),
        }
    }

    #[test]
    fn scalars_by_direction() {
        assert_eq!(sort_by_notation(&arr(json!([3, 1.5, 2])), &Value::Int(1)).unwrap(), arr(json!([1.5, 2, 3])));
        assert_eq!(sort_by_notation(&arr(json!(["b", "c", "a"])), &Value::Int(-1)).unwrap(), arr(json!(["c", "b", "a"])));
    }

    #[test]
    fn integers_and_doubles_compare_exactly() {
        let big = 1i64 << 53;
        let values = vec![Value::Int(big + 1), Value::Double(9_007_199_254_740_992.0), Value::Int(big), Value::Double(0.5)];
        let sorted = sort_by_notation(&values, &Value::Int(1)).unwrap();
        assert!(matches!(sorted[0], Value::Double(d) if d == 0.5));
        assert!(matches!(sorted[3], Value::Int(i) if i == big + 1));
        let rev = sort_by_notation(&values, &Value::Int(-1)).unwrap();
        assert!(matches!(rev[0], Value::Int(i) if i == big + 1));
    }

    #[test]
    fn mixed_types_follow_rank() {
        assert_eq!(
            sort_by_notation(&arr(json!([true, "x", 1, null])), &Value::Int(1)).unwrap(),
            arr(json!([null, 1, "x", true]))
        );
    }

    #[test]
    fn by_fields_is_stable() {
        let people = arr(json!([
            {"name": "a", "age": 30, "score": {"v": 1}},
            {"name": "b", "age": 20, "score": {"v": 2}},
            {"name": "c", "age": 30, "score": {"v": 2}},
            {"name": "d", "age": 20, "score": {"v": 2}}
        ]));
        let sorted = sort_by_notation(&people, &Value::from(json!({"age": 1, "score.v": -1}))).unwrap();
        let names: Vec<&str> =
            sorted.iter().filter_map(|p| p.as_map().and_then(|m| m.get("name")).and_then(Value::as_str)).collect();
        assert_eq!(names, ["b", "d", "c", "a"]);
    }

    #[test]
    fn bad_direction() {
        assert!(sort_by_notation(&arr(json!([1])), &Value::Int(2)).is_err());
        assert!(sort_by_notation(&arr(json!([1])), &Value::from(json!({"a": "up"}))).is_err());
    }
}
