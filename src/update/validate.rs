use indexmap::IndexMap;

use crate::errors::DocError;
use crate::path::{Attribute, create_document_path, parse_document_path};

use super::types::{UpdateOperation, ValidationResult};

/// Collect path conflicts: a path touched by two operators, or a path touched along
/// with one of its ancestors. Paths are compared in canonical form.
#[must_use]
pub fn validate_update_operation(operation: &UpdateOperation) -> ValidationResult {
    let mut errors = Vec::new();
    // canonical path -> (as written, attributes)
    let mut touched: IndexMap<String, (String, Vec<Attribute>)> = IndexMap::new();
    for (_, operand) in operation.iter() {
        for path in operand.keys() {
            let attrs = match parse_document_path(path) {
                Ok(attrs) => attrs,
                Err(e) => {
                    errors.push(e);
                    continue;
                }
            };
            let canonical = create_document_path(&attrs);
            if touched.contains_key(&canonical) {
                errors.push(DocError::PathConflict { path: path.clone(), conflict: path.clone() });
            }
            touched.insert(canonical, (path.clone(), attrs));
        }
    }
    for (path, attrs) in touched.values() {
        for depth in 1..attrs.len() {
            if let Some((ancestor, _)) = touched.get(&create_document_path(&attrs[..depth])) {
                errors.push(DocError::PathConflict { path: path.clone(), conflict: ancestor.clone() });
            }
        }
    }
    ValidationResult::from_errors(errors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;
    use serde_json::json;

    fn validate(j: serde_json::Value) -> ValidationResult {
        validate_update_operation(&UpdateOperation::try_from(&Value::from(j)).unwrap())
    }

    #[test]
    fn disjoint_paths_are_valid() {
        let result = validate(json!({"$set": {"a.b": 1, "a.c": 2}, "$inc": {"n": 1}}));
        assert!(result.valid);
        assert!(result.errors.is_empty());
    }

    #[test]
    fn ancestor_conflict() {
        let result = validate(json!({"$set": {"foo": [1]}, "$inc": {"foo[0]": 1}}));
        assert!(!result.valid);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].to_string(), "Updating the path 'foo[0]' would create a conflict at 'foo'");
    }

    #[test]
    fn same_path_under_two_operators() {
        let result = validate(json!({"$set": {"a": 1}, "$unset": {"a": ""}}));
        assert_eq!(result.errors.len(), 1);
        assert!(matches!(&result.errors[0], DocError::PathConflict { path, conflict } if path == "a" && conflict == "a"));
    }

    #[test]
    fn malformed_paths_are_reported() {
        let result = validate(json!({"$set": {"a[": 1}}));
        assert!(matches!(result.errors.as_slice(), [DocError::MalformedPath { .. }]));
    }
}
