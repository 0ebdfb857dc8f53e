use crate::path::Attribute;
use crate::value::{RegexValue, Value};

/// BSON type names and numbers accepted by `$type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BsonType {
    Double,
    String,
    Object,
    Array,
    BinData,
    Undefined,
    ObjectId,
    Bool,
    Date,
    Null,
    Regex,
    DbPointer,
    Javascript,
    Symbol,
    JavascriptWithScope,
    Int,
    Timestamp,
    Long,
    Decimal,
    MinKey,
    MaxKey,
}

impl BsonType {
    pub const ALL: [BsonType; 21] = [
        Self::Double,
        Self::String,
        Self::Object,
        Self::Array,
        Self::BinData,
        Self::Undefined,
        Self::ObjectId,
        Self::Bool,
        Self::Date,
        Self::Null,
        Self::Regex,
        Self::DbPointer,
        Self::Javascript,
        Self::Symbol,
        Self::JavascriptWithScope,
        Self::Int,
        Self::Timestamp,
        Self::Long,
        Self::Decimal,
        Self::MinKey,
        Self::MaxKey,
    ];

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Double => "double",
            Self::String => "string",
            Self::Object => "object",
            Self::Array => "array",
            Self::BinData => "binData",
            Self::Undefined => "undefined",
            Self::ObjectId => "objectId",
            Self::Bool => "bool",
            Self::Date => "date",
            Self::Null => "null",
            Self::Regex => "regex",
            Self::DbPointer => "dbPointer",
            Self::Javascript => "javascript",
            Self::Symbol => "symbol",
            Self::JavascriptWithScope => "javascriptWithScope",
            Self::Int => "int",
            Self::Timestamp => "timestamp",
            Self::Long => "long",
            Self::Decimal => "decimal",
            Self::MinKey => "minKey",
            Self::MaxKey => "maxKey",
        }
    }

    #[must_use]
    pub fn number(self) -> i64 {
        match self {
            Self::MinKey => -1,
            Self::MaxKey => 127,
            other => Self::ALL.iter().position(|t| *t == other).map_or(0, |i| {
                crate::num::usize_to_i64_saturating(i) + 1
            }),
        }
    }

    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }

    #[must_use]
    pub fn from_number(n: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.number() == n)
    }
}

/// Inferred BSON type of a value. Integral doubles report `int`.
#[must_use]
pub fn bson_type_of(v: &Value) -> BsonType {
    match v {
        Value::Undefined => BsonType::Undefined,
        Value::Null => BsonType::Null,
        Value::Bool(_) => BsonType::Bool,
        Value::Int(_) => BsonType::Int,
        Value::Double(f) if f.fract() == 0.0 => BsonType::Int,
        Value::Double(_) => BsonType::Double,
        Value::String(_) => BsonType::String,
        Value::Date(_) => BsonType::Date,
        Value::Regex(_) => BsonType::Regex,
        Value::Array(_) => BsonType::Array,
        Value::Object(_) | Value::Instance(_) => BsonType::Object,
        Value::Constructor(_) => BsonType::Javascript,
    }
}

/// A non-empty plain object whose first key starts with `$`.
#[must_use]
pub fn is_query_condition(v: &Value) -> bool {
    v.as_object().and_then(|m| m.keys().next()).is_some_and(|k| k.starts_with('$'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl CmpOp {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "$eq",
            Self::Ne => "$ne",
            Self::Gt => "$gt",
            Self::Gte => "$gte",
            Self::Lt => "$lt",
            Self::Lte => "$lte",
        }
    }

    pub(crate) fn from_key(key: &str) -> Option<Self> {
        Some(match key {
            "$eq" => Self::Eq,
            "$ne" => Self::Ne,
            "$gt" => Self::Gt,
            "$gte" => Self::Gte,
            "$lt" => Self::Lt,
            "$lte" => Self::Lte,
            _ => return None,
        })
    }
}

/// Recognized operators that have no evaluation.
pub const UNSUPPORTED_OPERATORS: [&str; 10] = [
    "$text",
    "$where",
    "$geoIntersects",
    "$geoWithin",
    "$near",
    "$nearSphere",
    "$bitsAllClear",
    "$bitsAllSet",
    "$bitsAnyClear",
    "$bitsAnySet",
];

/// One `$operator: operand` entry of a query condition.
#[derive(Debug, Clone, PartialEq)]
pub enum Clause {
    Compare(CmpOp, Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Not(Box<QueryCondition>),
    Exists(bool),
    Type(BsonType),
    Mod { divisor: f64, remainder: f64 },
    /// `native` is false when the pattern was given as a string.
    Regex { regex: RegexValue, native: bool },
    Options(String),
    All(Vec<Value>),
    ElemMatch(Box<ComplexFindOperation>),
    Size(usize),
    Unsupported(String),
}

/// Conjunction of clauses matched against a single value. No clauses match everything.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct QueryCondition {
    pub clauses: Vec<Clause>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldCondition {
    pub path: String,
    pub(crate) attrs: Vec<Attribute>,
    pub condition: QueryCondition,
}

/// Field path to condition map; every field must match.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SimpleFindOperation {
    pub fields: Vec<FieldCondition>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FindOperation {
    And(Vec<FindOperation>),
    Or(Vec<FindOperation>),
    Nor(Vec<FindOperation>),
    Simple(SimpleFindOperation),
}

/// Operand of `$elemMatch` and `$pull`: a condition on each element itself, or a
/// find operation over each element's fields.
#[derive(Debug, Clone, PartialEq)]
pub enum ComplexFindOperation {
    Condition(QueryCondition),
    Find(FindOperation),
}

/// Result of splitting values by a find operation.
#[derive(Debug, Clone, PartialEq)]
pub struct Classified<T> {
    pub matched: Vec<T>,
    pub unmatched: Vec<T>,
}

impl<T> Default for Classified<T> {
    fn default() -> Self {
        Self { matched: Vec::new(), unmatched: Vec::new() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bson_type_table_is_bidirectional() {
        assert_eq!(BsonType::Double.number(), 1);
        assert_eq!(BsonType::Decimal.number(), 19);
        assert_eq!(BsonType::MinKey.number(), -1);
        assert_eq!(BsonType::MaxKey.number(), 127);
        for t in BsonType::ALL {
            assert_eq!(BsonType::from_number(t.number()), Some(t));
            assert_eq!(BsonType::from_name(t.name()), Some(t));
        }
        assert_eq!(BsonType::from_number(20), None);
    }

    #[test]
    fn inferred_types() {
        assert_eq!(bson_type_of(&Value::Double(2.0)), BsonType::Int);
        assert_eq!(bson_type_of(&Value::Double(2.5)), BsonType::Double);
        assert_eq!(bson_type_of(&Value::from(json!([1]))), BsonType::Array);
        assert_eq!(bson_type_of(&Value::from(json!({}))), BsonType::Object);
        assert_eq!(bson_type_of(&Value::Null), BsonType::Null);
    }

    #[test]
    fn query_condition_detection() {
        assert!(is_query_condition(&Value::from(json!({"$gt": 1}))));
        assert!(!is_query_condition(&Value::from(json!({"a": 1, "$gt": 1}))));
        assert!(!is_query_condition(&Value::from(json!({}))));
        assert!(!is_query_condition(&Value::from("$gt")));
    }
}
