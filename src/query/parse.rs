use crate::config::{self, CombinatorPolicy};
use crate::errors::{DocError, Result};
use crate::path::parse_document_path;
use crate::value::{Map, RegexValue, Value};

use super::types::{
    BsonType, Clause, CmpOp, ComplexFindOperation, FieldCondition, FindOperation, QueryCondition,
    SimpleFindOperation, UNSUPPORTED_OPERATORS, is_query_condition,
};

const COMBINATORS: [&str; 3] = ["$and", "$nor", "$or"];

/// Canonical condition form of a raw operand.
///
/// - `null`/absent becomes `{$eq: null}`
/// - a regex becomes `{$regex: re}`
/// - any other non-object (arrays included) becomes `{$eq: v}`
/// - `{}` stays as is and matches everything
/// - an object whose first key lacks `$` becomes `{$eq: <object>}`
#[must_use]
pub fn normalize_query_condition(raw: &Value) -> Value {
    let wrap = |key: &str, v: Value| {
        let mut m = Map::new();
        m.insert(key.to_string(), v);
        Value::object(m)
    };
    match raw {
        Value::Undefined | Value::Null => wrap("$eq", Value::Null),
        Value::Regex(_) => wrap("$regex", raw.clone()),
        Value::Object(m) if m.is_empty() || is_query_condition(raw) => raw.clone(),
        other => wrap("$eq", other.clone()),
    }
}

impl TryFrom<&Value> for QueryCondition {
    type Error = DocError;

    fn try_from(raw: &Value) -> Result<Self> {
        let normalized = normalize_query_condition(raw);
        let Some(map) = normalized.as_object() else {
            return Ok(Self::default());
        };
        let mut clauses = Vec::with_capacity(map.len());
        for (op, operand) in map {
            clauses.push(parse_clause(op, operand, map)?);
        }
        Ok(Self { clauses })
    }
}

fn operand_array<'a>(op: &str, operand: &'a Value) -> Result<&'a [Value]> {
    operand.as_array().ok_or_else(|| DocError::operand(op, "expected an array"))
}

fn parse_clause(op: &str, operand: &Value, siblings: &Map) -> Result<Clause> {
    if let Some(cmp) = CmpOp::from_key(op) {
        return Ok(Clause::Compare(cmp, operand.clone()));
    }
    Ok(match op {
        "$in" => Clause::In(operand_array(op, operand)?.to_vec()),
        "$nin" => Clause::Nin(operand_array(op, operand)?.to_vec()),
        "$all" => Clause::All(operand_array(op, operand)?.to_vec()),
        "$not" => Clause::Not(Box::new(QueryCondition::try_from(operand)?)),
        "$exists" => Clause::Exists(match operand {
            Value::Bool(b) => *b,
            v if v.is_number() => v.as_f64().is_some_and(|f| f != 0.0),
            _ => return Err(DocError::operand(op, "expected a boolean")),
        }),
        "$type" => {
            let t = match operand {
                Value::String(name) => BsonType::from_name(name),
                v => v.as_i64().and_then(BsonType::from_number),
            };
            Clause::Type(t.ok_or_else(|| DocError::operand(op, format!("unknown BSON type {operand}")))?)
        }
        "$mod" => match operand.as_array() {
            Some([d, r]) => match (d.as_f64(), r.as_f64()) {
                (Some(divisor), Some(remainder)) => Clause::Mod { divisor, remainder },
                _ => return Err(DocError::operand(op, "divisor and remainder must be numbers")),
            },
            _ => return Err(DocError::operand(op, "expected [divisor, remainder]")),
        },
        "$regex" => match operand {
            Value::Regex(r) => Clause::Regex { regex: r.clone(), native: true },
            Value::String(pattern) => {
                let flags = match siblings.get("$options") {
                    Some(Value::String(f)) => f.as_str(),
                    _ => "",
                };
                Clause::Regex { regex: RegexValue::new(pattern, flags)?, native: false }
            }
            _ => return Err(DocError::operand(op, "expected a pattern string or a regex")),
        },
        "$options" => match operand {
            Value::String(f) => Clause::Options(f.clone()),
            _ => return Err(DocError::operand(op, "expected a flags string")),
        },
        "$elemMatch" => Clause::ElemMatch(Box::new(ComplexFindOperation::try_from(operand)?)),
        "$size" => Clause::Size(
            operand
                .as_i64()
                .and_then(crate::num::i64_to_usize)
                .ok_or_else(|| DocError::operand(op, "expected a non-negative integer"))?,
        ),
        unsupported if UNSUPPORTED_OPERATORS.contains(&unsupported) => {
            Clause::Unsupported(unsupported.to_string())
        }
        unknown => return Err(DocError::UnknownOperator(unknown.to_string())),
    })
}

impl TryFrom<&Value> for ComplexFindOperation {
    type Error = DocError;

    fn try_from(raw: &Value) -> Result<Self> {
        match raw {
            Value::Object(m) if !m.is_empty() && (!is_query_condition(raw) || starts_with_combinator(m)) => {
                Ok(Self::Find(FindOperation::try_from(raw)?))
            }
            _ => Ok(Self::Condition(QueryCondition::try_from(raw)?)),
        }
    }
}

fn starts_with_combinator(map: &Map) -> bool {
    map.keys().next().is_some_and(|k| COMBINATORS.contains(&k.as_str()))
}

impl TryFrom<&Value> for FindOperation {
    type Error = DocError;

    fn try_from(raw: &Value) -> Result<Self> {
        let map = raw
            .as_object()
            .ok_or_else(|| DocError::operand("find operation", format!("expected an object, got {}", raw.type_name())))?;
        let present: Vec<&str> =
            COMBINATORS.into_iter().filter(|k| map.get(*k).is_some_and(|v| !v.is_nullish())).collect();
        let Some(&chosen) = present.first() else {
            return SimpleFindOperation::try_from(map).map(Self::Simple);
        };
        if present.len() > 1 || map.len() > 1 {
            match config::combinator_policy() {
                CombinatorPolicy::Strict => {
                    return Err(DocError::operand(
                        chosen,
                        "a combinator cannot share its object with other keys",
                    ));
                }
                CombinatorPolicy::Priority => {
                    let ignored: Vec<&String> = map.keys().filter(|k| k.as_str() != chosen).collect();
                    log::debug!("find operation uses {chosen}; ignoring {ignored:?}");
                }
            }
        }
        let branches = map
            .get(chosen)
            .and_then(Value::as_array)
            .ok_or_else(|| DocError::operand(chosen, "expected an array of find operations"))?
            .iter()
            .map(Self::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(match chosen {
            "$and" => Self::And(branches),
            "$nor" => Self::Nor(branches),
            _ => Self::Or(branches),
        })
    }
}

impl TryFrom<&Map> for SimpleFindOperation {
    type Error = DocError;

    fn try_from(map: &Map) -> Result<Self> {
        let fields = map
            .iter()
            .map(|(path, cond)| {
                Ok(FieldCondition {
                    path: path.clone(),
                    attrs: parse_document_path(path)?,
                    condition: QueryCondition::try_from(cond)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { fields })
    }
}

/// # Errors
/// Returns an error if the JSON is invalid or does not describe a find operation.
pub fn parse_find_json(json: &str) -> Result<FindOperation> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    FindOperation::try_from(&Value::from(raw))
}

/// # Errors
/// Returns an error if the JSON is invalid or holds an unknown operator.
pub fn parse_condition_json(json: &str) -> Result<QueryCondition> {
    let raw: serde_json::Value = serde_json::from_str(json)?;
    QueryCondition::try_from(&Value::from(raw))
}
