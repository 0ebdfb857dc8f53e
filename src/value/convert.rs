use chrono::{DateTime, Utc};
use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use std::sync::Arc;

use super::core::{Map, Value};

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        use serde_json::Value as J;
        match v {
            J::Null => Self::Null,
            J::Bool(b) => Self::Bool(b),
            J::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    n.as_f64().map_or(Self::Null, Self::Double)
                }
            }
            J::String(s) => Self::String(s),
            J::Array(a) => Self::array(a.into_iter().map(Self::from).collect()),
            J::Object(o) => Self::object(o.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
        }
    }
}

/// Lossy: dates become RFC 3339 strings, regexes `/pattern/flags`, undefined becomes null.
impl From<&Value> for serde_json::Value {
    fn from(v: &Value) -> Self {
        use serde_json::Value as J;
        match v {
            Value::Undefined | Value::Null | Value::Constructor(_) => J::Null,
            Value::Bool(b) => J::Bool(*b),
            Value::Int(i) => J::from(*i),
            Value::Double(f) => serde_json::Number::from_f64(*f).map_or(J::Null, J::Number),
            Value::String(s) => J::String(s.clone()),
            Value::Date(d) => J::String(d.to_rfc3339()),
            Value::Regex(r) => J::String(r.to_string()),
            Value::Array(a) => J::Array(a.iter().map(J::from).collect()),
            Value::Object(_) | Value::Instance(_) => J::Object(
                v.as_map()
                    .into_iter()
                    .flatten()
                    .map(|(k, v)| (k.clone(), J::from(v)))
                    .collect(),
            ),
        }
    }
}

impl From<bson::Bson> for Value {
    fn from(b: bson::Bson) -> Self {
        use bson::Bson as B;
        match b {
            B::Double(f) => Self::Double(f),
            B::String(s) => Self::String(s),
            B::Array(a) => Self::array(a.into_iter().map(Self::from).collect()),
            B::Document(d) => Self::object(d.into_iter().map(|(k, v)| (k, Self::from(v))).collect()),
            B::Boolean(b) => Self::Bool(b),
            B::Null => Self::Null,
            B::Undefined => Self::Undefined,
            B::Int32(i) => Self::Int(i64::from(i)),
            B::Int64(i) => Self::Int(i),
            B::DateTime(dt) => {
                DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).map_or(Self::Null, Self::Date)
            }
            // Remaining BSON types have no native counterpart; keep their extended JSON form.
            other => serde_json::to_value(&other).map_or(Self::Null, Self::from),
        }
    }
}

impl From<&Value> for bson::Bson {
    fn from(v: &Value) -> Self {
        use bson::Bson as B;
        match v {
            Value::Undefined => B::Undefined,
            Value::Null => B::Null,
            Value::Bool(b) => B::Boolean(*b),
            Value::Int(i) => i32::try_from(*i).map_or(B::Int64(*i), B::Int32),
            Value::Double(f) => B::Double(*f),
            Value::String(s) => B::String(s.clone()),
            Value::Date(d) => B::DateTime(bson::DateTime::from_millis(d.timestamp_millis())),
            Value::Regex(r) => {
                let mut d = bson::Document::new();
                d.insert("$regex", r.pattern());
                d.insert("$options", r.flags());
                B::Document(d)
            }
            Value::Array(a) => B::Array(a.iter().map(B::from).collect()),
            Value::Object(_) | Value::Instance(_) => {
                let mut d = bson::Document::new();
                for (k, v) in v.as_map().into_iter().flatten() {
                    d.insert(k.clone(), B::from(v));
                }
                B::Document(d)
            }
            Value::Constructor(c) => B::JavaScriptCode(c.name().to_string()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Undefined | Self::Null | Self::Constructor(_) => s.serialize_unit(),
            Self::Bool(b) => s.serialize_bool(*b),
            Self::Int(i) => s.serialize_i64(*i),
            Self::Double(f) => s.serialize_f64(*f),
            Self::String(v) => s.serialize_str(v),
            Self::Date(d) => s.serialize_str(&d.to_rfc3339()),
            Self::Regex(r) => s.collect_str(r),
            Self::Array(a) => s.collect_seq(a.iter()),
            Self::Object(m) => s.collect_map(m.iter()),
            Self::Instance(i) => s.collect_map(i.fields().iter()),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(d).map(Self::from)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Self::Double(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(d: DateTime<Utc>) -> Self {
        Self::Date(d)
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(items))
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Object(Arc::new(map))
    }
}
