use std::fmt;
use std::sync::Arc;

use super::core::{Map, Value};
use crate::errors::DocError;

type Factory = dyn Fn(Value) -> Result<Value, DocError> + Send + Sync;

struct ConstructorInner {
    name: String,
    factory: Option<Box<Factory>>,
}

/// Factory that rebuilds a restorable value from its plain data.
///
/// Two constructors are equal only when they are the same handle (or clones of it).
#[derive(Clone)]
pub struct Constructor(Arc<ConstructorInner>);

impl Constructor {
    /// A class-like constructor: plain object data becomes an [`Instance`] tagged with it.
    pub fn class(name: impl Into<String>) -> Self {
        Self(Arc::new(ConstructorInner { name: name.into(), factory: None }))
    }

    /// A constructor that delegates to a caller-supplied function.
    pub fn with_fn<F>(name: impl Into<String>, f: F) -> Self
    where
        F: Fn(Value) -> Result<Value, DocError> + Send + Sync + 'static,
    {
        Self(Arc::new(ConstructorInner { name: name.into(), factory: Some(Box::new(f)) }))
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.0.name
    }

    #[must_use]
    pub fn same(&self, other: &Constructor) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// Rebuild a value from plain data.
    ///
    /// # Errors
    /// Class constructors need an object or instance; custom factories may fail on their own.
    pub fn construct(&self, plain: Value) -> Result<Value, DocError> {
        if let Some(f) = &self.0.factory {
            return f(plain);
        }
        match plain {
            Value::Object(fields) => {
                Ok(Value::Instance(Arc::new(Instance::new(self.clone(), fields))))
            }
            Value::Instance(inst) => {
                Ok(Value::Instance(Arc::new(Instance::new(self.clone(), inst.fields.clone()))))
            }
            other => Err(DocError::Restore(format!(
                "constructor '{}' cannot be applied to {}",
                self.name(),
                other.type_name()
            ))),
        }
    }
}

impl fmt::Debug for Constructor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Constructor").field(&self.0.name).finish()
    }
}

/// Fields produced by a [`Constructor`].
#[derive(Clone, Debug)]
pub struct Instance {
    constructor: Constructor,
    fields: Arc<Map>,
}

impl Instance {
    pub(crate) fn new(constructor: Constructor, fields: Arc<Map>) -> Self {
        Self { constructor, fields }
    }

    #[must_use]
    pub fn constructor(&self) -> &Constructor {
        &self.constructor
    }

    #[must_use]
    pub fn fields(&self) -> &Map {
        &self.fields
    }

    /// The fields as a plain object sharing the same allocation.
    #[must_use]
    pub fn to_plain(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}

impl PartialEq for Instance {
    fn eq(&self, other: &Self) -> bool {
        self.constructor.same(&other.constructor)
            && (Arc::ptr_eq(&self.fields, &other.fields) || self.fields == other.fields)
    }
}

/// A compiled regular expression with its source pattern and flags.
#[derive(Clone, Debug)]
pub struct RegexValue {
    pattern: String,
    flags: String,
    compiled: regex::Regex,
}

impl RegexValue {
    /// Flags follow `$options`: `i`, `m`, `s`, `x`; `g`, `u` and `y` are accepted and ignored.
    ///
    /// # Errors
    /// Fails on an unknown flag or a pattern that does not compile.
    pub fn new(pattern: &str, flags: &str) -> Result<Self, DocError> {
        let mut builder = regex::RegexBuilder::new(pattern);
        for flag in flags.chars() {
            match flag {
                'i' => builder.case_insensitive(true),
                'm' => builder.multi_line(true),
                's' => builder.dot_matches_new_line(true),
                'x' => builder.ignore_whitespace(true),
                'g' | 'u' | 'y' => &mut builder,
                other => {
                    return Err(DocError::operand("$options", format!("unknown flag '{other}'")));
                }
            };
        }
        Ok(Self { pattern: pattern.to_string(), flags: flags.to_string(), compiled: builder.build()? })
    }

    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    #[must_use]
    pub fn flags(&self) -> &str {
        &self.flags
    }

    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.compiled.is_match(text)
    }
}

impl PartialEq for RegexValue {
    fn eq(&self, other: &Self) -> bool {
        self.pattern == other.pattern && self.flags == other.flags
    }
}

impl fmt::Display for RegexValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.pattern, self.flags)
    }
}
