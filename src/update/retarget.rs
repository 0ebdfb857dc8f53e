use crate::value::Value;

use super::types::{UpdateOperation, UpdateOperator};

/// Prefix every path of `operation` with `prefix`, so that an operation written for a
/// sub-document applies to the document holding it. `prefix` must already be a
/// well-formed, escaped document path.
#[must_use]
pub fn retarget_operation(prefix: &str, operation: &UpdateOperation) -> UpdateOperation {
    operation
        .iter()
        .map(|(operator, operand)| {
            let moved = operand.iter().map(|(path, v)| (format!("{prefix}.{path}"), v.clone())).collect();
            (operator, moved)
        })
        .collect()
}

/// [`retarget_operation`] plus a `$restore` of `prefix` itself, so the sub-document
/// keeps its constructor after the update.
#[must_use]
pub fn retarget_and_restore(prefix: &str, operation: &UpdateOperation) -> UpdateOperation {
    let mut retargeted = retarget_operation(prefix, operation);
    retargeted.insert(UpdateOperator::Restore, prefix, Value::from(""));
    retargeted
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefixes_every_path() {
        let op = UpdateOperation::try_from(&Value::from(json!({"$set": {"a": 1}, "$inc": {"b.c": 2}}))).unwrap();
        assert_eq!(
            retarget_operation("items[1]", &op).to_value(),
            Value::from(json!({"$set": {"items[1].a": 1}, "$inc": {"items[1].b.c": 2}}))
        );
    }

    #[test]
    fn restore_marker_added() {
        let op = UpdateOperation::try_from(&Value::from(json!({"name": "x"}))).unwrap();
        assert_eq!(
            retarget_and_restore("owner", &op).to_value(),
            Value::from(json!({"$set": {"owner.name": "x"}, "$restore": {"owner": ""}}))
        );
    }
}
