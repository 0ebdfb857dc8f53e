//! Document paths, MongoDB-style query conditions and immutable update operations
//! over nested values.
//!
//! ```
//! use docops::{UpdateOperation, Value, update};
//! use serde_json::json;
//!
//! let doc = Value::from(json!({"name": {"first": "John"}, "age": 30}));
//! let op = UpdateOperation::try_from(&Value::from(json!({"$set": {"name.last": "Doe"}, "$inc": {"age": 1}})))?;
//! let updated = update(&doc, &[op])?;
//! assert_eq!(updated, Value::from(json!({"name": {"first": "John", "last": "Doe"}, "age": 31})));
//! # Ok::<(), docops::DocError>(())
//! ```

pub mod config;
pub mod errors;
pub mod logger;
pub mod num;
pub mod path;
pub mod query;
pub mod trace;
pub mod update;
pub mod value;

pub use errors::{DocError, Result};
pub use path::{
    Attribute, convert_to_dot_notation, create_document_path, get_nested_value, get_nested_value_strict,
    has_own_nested_property, parse_document_path,
};
pub use query::{
    ComplexFindOperation, FindOperation, QueryCondition, check_condition, classify, normalize_query_condition,
    retrieve,
};
pub use update::{
    UpdateOperation, UpdateOperator, ValidationResult, merge_update_operations, normalize_update_operation,
    retarget_and_restore, retarget_operation, update, update_and_restore, update_prop, update_prop_and_restore,
    validate_update_operation,
};
pub use value::{Constructor, Instance, Map, Value};

/// Apply logging and engine settings from the environment.
///
/// Reads `DOCOPS_LOG_LEVEL`, `DOCOPS_MAX_PATH_DEPTH` and `DOCOPS_COMBINATORS`. Without
/// this call the crate never looks at the environment.
pub fn init() {
    logger::configure_from_env();
    config::configure_from_env();
}
