use std::fmt;

use indexmap::IndexMap;

use crate::errors::{DocError, Result};
use crate::value::{Map, Value};

/// Every update operator. `ALL` fixes the order visitors walk them in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum UpdateOperator {
    Set,
    Inc,
    Min,
    Max,
    Mul,
    AddToSet,
    Pop,
    Pull,
    PullAll,
    Push,
    CurrentDate,
    Bit,
    Unset,
    Restore,
    Rename,
    Append,
}

impl UpdateOperator {
    pub const ALL: [UpdateOperator; 16] = [
        Self::Set,
        Self::Inc,
        Self::Min,
        Self::Max,
        Self::Mul,
        Self::AddToSet,
        Self::Pop,
        Self::Pull,
        Self::PullAll,
        Self::Push,
        Self::CurrentDate,
        Self::Bit,
        Self::Unset,
        Self::Restore,
        Self::Rename,
        Self::Append,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Set => "$set",
            Self::Inc => "$inc",
            Self::Min => "$min",
            Self::Max => "$max",
            Self::Mul => "$mul",
            Self::AddToSet => "$addToSet",
            Self::Pop => "$pop",
            Self::Pull => "$pull",
            Self::PullAll => "$pullAll",
            Self::Push => "$push",
            Self::CurrentDate => "$currentDate",
            Self::Bit => "$bit",
            Self::Unset => "$unset",
            Self::Restore => "$restore",
            Self::Rename => "$rename",
            Self::Append => "$append",
        }
    }

    /// Breaking operators may remove a value or change the shape of its container.
    #[must_use]
    pub fn is_breaking(self) -> bool {
        matches!(self, Self::Unset | Self::Rename)
    }

    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.as_str() == key)
    }
}

impl fmt::Display for UpdateOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for UpdateOperator {
    type Error = DocError;

    fn try_from(key: &str) -> Result<Self> {
        Self::from_key(key).ok_or_else(|| DocError::UnknownOperator(key.to_string()))
    }
}

/// Document path to operator-specific value.
pub type Operand = Map;

/// A normalized update operation: operators in insertion order, each with its operand.
///
/// `$push` and `$addToSet` operands always carry an `$each` array.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOperation {
    pub(crate) operators: IndexMap<UpdateOperator, Operand>,
}

impl UpdateOperation {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One operator touching one path. Sugar for `$push`/`$addToSet` is expanded.
    #[must_use]
    pub fn single(operator: UpdateOperator, path: impl Into<String>, value: Value) -> Self {
        let mut op = Self::new();
        op.insert(operator, path, value);
        op
    }

    /// Add or overwrite `path` under `operator`.
    pub fn insert(&mut self, operator: UpdateOperator, path: impl Into<String>, value: Value) {
        let value = match operator {
            UpdateOperator::Push | UpdateOperator::AddToSet => super::normalize::each_modifier(value),
            _ => value,
        };
        self.operators.entry(operator).or_default().insert(path.into(), value);
    }

    #[must_use]
    pub fn get(&self, operator: UpdateOperator) -> Option<&Operand> {
        self.operators.get(&operator)
    }

    pub fn iter(&self) -> impl Iterator<Item = (UpdateOperator, &Operand)> {
        self.operators.iter().map(|(op, operand)| (*op, operand))
    }

    pub fn operators(&self) -> impl Iterator<Item = UpdateOperator> + '_ {
        self.operators.keys().copied()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.operators.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.operators.len()
    }

    /// Whether any operator may change the shape of its target.
    #[must_use]
    pub fn is_breaking(&self) -> bool {
        self.operators.keys().any(|op| op.is_breaking())
    }

    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::object(
            self.operators
                .iter()
                .map(|(op, operand)| (op.as_str().to_string(), Value::object(operand.clone())))
                .collect(),
        )
    }
}

impl FromIterator<(UpdateOperator, Operand)> for UpdateOperation {
    fn from_iter<I: IntoIterator<Item = (UpdateOperator, Operand)>>(iter: I) -> Self {
        Self { operators: iter.into_iter().collect() }
    }
}

/// Outcome of [`validate_update_operation`](super::validate_update_operation).
#[derive(Debug, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<DocError>,
}

impl ValidationResult {
    pub(crate) fn from_errors(errors: Vec<DocError>) -> Self {
        Self { valid: errors.is_empty(), errors }
    }
}
