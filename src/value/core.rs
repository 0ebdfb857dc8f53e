use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

use super::instance::{Constructor, Instance, RegexValue};
use crate::errors::DocError;
use crate::path::Attribute;

/// Ordered map backing object values.
pub type Map = IndexMap<String, Value>;

/// Shared "absent" value handed out by lookups that find nothing.
pub(crate) static UNDEFINED: Value = Value::Undefined;

/// A node of a document tree.
///
/// Containers are reference counted: cloning a `Value` never deep-copies, and the
/// updater only replaces the containers sitting on the path it writes to.
#[derive(Clone, Debug, Default)]
pub enum Value {
    /// Absent value. Distinct from `Null`.
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    Double(f64),
    String(String),
    Date(DateTime<Utc>),
    Regex(RegexValue),
    Array(Arc<Vec<Value>>),
    Object(Arc<Map>),
    /// Plain fields tagged with the constructor that produced them.
    Instance(Arc<Instance>),
    Constructor(Constructor),
}

impl Value {
    pub fn array(items: Vec<Value>) -> Self {
        Self::Array(Arc::new(items))
    }

    pub fn object(map: Map) -> Self {
        Self::Object(Arc::new(map))
    }

    pub fn empty_object() -> Self {
        Self::Object(Arc::new(Map::new()))
    }

    /// Build a regex value from a pattern and `$options`-style flags.
    ///
    /// # Errors
    /// Fails if the pattern does not compile or a flag is not recognized.
    pub fn regex(pattern: &str, flags: &str) -> Result<Self, DocError> {
        RegexValue::new(pattern, flags).map(Self::Regex)
    }

    pub fn instance(constructor: &Constructor, fields: Map) -> Self {
        Self::Instance(Arc::new(Instance::new(constructor.clone(), Arc::new(fields))))
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    /// `null` or absent.
    #[must_use]
    pub fn is_nullish(&self) -> bool {
        matches!(self, Self::Undefined | Self::Null)
    }

    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Double(_))
    }

    /// Scalars, dates, regexes and constructors. Everything without traversable fields.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        !matches!(self, Self::Array(_) | Self::Object(_) | Self::Instance(_))
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            Self::Double(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer view of a number, accepting doubles only when they are integral.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Double(f) => crate::num::f64_to_i64_exact(*f),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Own fields of an object or an instance.
    #[must_use]
    pub fn as_map(&self) -> Option<&Map> {
        match self {
            Self::Object(m) => Some(m),
            Self::Instance(i) => Some(i.fields()),
            _ => None,
        }
    }

    /// Map of a plain object only; instances are not included.
    #[must_use]
    pub fn as_object(&self) -> Option<&Map> {
        match self {
            Self::Object(m) => Some(m),
            _ => None,
        }
    }

    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::Regex(_) => "regex",
            Self::Array(_) => "array",
            Self::Object(_) => "object",
            Self::Instance(_) => "instance",
            Self::Constructor(_) => "constructor",
        }
    }

    /// Child reached by one path attribute.
    ///
    /// Object keys are addressed by either attribute form (`a[0]` reads key `"0"`), and
    /// arrays accept a digit-only key as an index.
    #[must_use]
    pub fn child(&self, attr: &Attribute) -> Option<&Value> {
        match (self, attr) {
            (Self::Object(_) | Self::Instance(_), Attribute::Key(k)) => self.as_map()?.get(k),
            (Self::Object(_) | Self::Instance(_), Attribute::Index(i)) => {
                self.as_map()?.get(&i.to_string())
            }
            (Self::Array(a), _) => a.get(attr.as_index()?),
            _ => None,
        }
    }

    /// Whether `attr` names an own slot of this container.
    #[must_use]
    pub fn has_own(&self, attr: &Attribute) -> bool {
        match (self, attr) {
            (Self::Object(_) | Self::Instance(_), _) => {
                self.as_map().is_some_and(|m| m.contains_key(attr.to_string().as_str()))
            }
            (Self::Array(a), _) => attr.as_index().is_some_and(|i| i < a.len()),
            _ => false,
        }
    }

    /// Reference identity: both values share the same container allocation.
    #[must_use]
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b),
            (Self::Instance(a), Self::Instance(b)) => Arc::ptr_eq(a, b),
            (Self::Constructor(a), Self::Constructor(b)) => a.same(b),
            _ => false,
        }
    }

    /// Ordering within one type bracket. Numbers, strings, dates and booleans
    /// compare among themselves; every other pairing is incomparable.
    #[must_use]
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Self::Int(a), Self::Int(b)) => Some(a.cmp(b)),
            (a, b) if a.is_number() && b.is_number() => a.as_f64()?.partial_cmp(&b.as_f64()?),
            (Self::String(a), Self::String(b)) => Some(a.cmp(b)),
            (Self::Date(a), Self::Date(b)) => Some(a.cmp(b)),
            (Self::Bool(a), Self::Bool(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// String form used when a regex is tested against a non-string scalar.
    pub(crate) fn scalar_text(&self) -> Option<String> {
        match self {
            Self::String(s) => Some(s.clone()),
            Self::Int(i) => Some(i.to_string()),
            Self::Double(f) => Some(f.to_string()),
            Self::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Undefined, Self::Undefined) | (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Double(a), Self::Double(b)) => a == b,
            #[allow(clippy::cast_precision_loss)]
            (Self::Int(i), Self::Double(f)) | (Self::Double(f), Self::Int(i)) => *i as f64 == *f,
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Date(a), Self::Date(b)) => a == b,
            (Self::Regex(a), Self::Regex(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Object(a), Self::Object(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Instance(a), Self::Instance(b)) => Arc::ptr_eq(a, b) || a == b,
            (Self::Constructor(a), Self::Constructor(b)) => a.same(b),
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Undefined => f.write_str("undefined"),
            Self::Regex(r) => write!(f, "{r}"),
            Self::Constructor(c) => write!(f, "[constructor {}]", c.name()),
            other => write!(f, "{}", serde_json::Value::from(other)),
        }
    }
}
