use std::borrow::Borrow;

use crate::errors::Result;
use crate::path::get_by_attributes;
use crate::value::Value;

use super::types::{Classified, ComplexFindOperation, FindOperation, SimpleFindOperation};

impl SimpleFindOperation {
    /// Every field's value satisfies its condition.
    ///
    /// # Errors
    /// `UnsupportedOperator` when an unimplemented operator is reached.
    pub fn matches(&self, doc: &Value) -> Result<bool> {
        for field in &self.fields {
            if !field.condition.matches(get_by_attributes(doc, &field.attrs))? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// Split values into those matching `op` and the rest.
///
/// `$and` narrows the matched set branch by branch, `$or` pulls extra matches out
/// of the unmatched set, and `$nor` keeps what every branch rejects. Within a
/// combinator, matched values appear in the order the branches collected them.
///
/// # Errors
/// `UnsupportedOperator` when an unimplemented operator is reached.
pub fn classify<T: Borrow<Value>>(values: Vec<T>, op: &FindOperation) -> Result<Classified<T>> {
    classify_by(values, op, &|t: &T| <T as Borrow<Value>>::borrow(t))
}

fn classify_by<T, F>(values: Vec<T>, op: &FindOperation, get: &F) -> Result<Classified<T>>
where
    F: Fn(&T) -> &Value,
{
    match op {
        FindOperation::And(branches) => {
            let mut acc = Classified { matched: values, unmatched: Vec::new() };
            for branch in branches {
                let c = classify_by(acc.matched, branch, get)?;
                acc.matched = c.matched;
                acc.unmatched.extend(c.unmatched);
            }
            Ok(acc)
        }
        FindOperation::Nor(branches) => {
            let mut acc = Classified { matched: values, unmatched: Vec::new() };
            for branch in branches {
                let c = classify_by(acc.matched, branch, get)?;
                acc.matched = c.unmatched;
                acc.unmatched.extend(c.matched);
            }
            Ok(acc)
        }
        FindOperation::Or(branches) => {
            let mut acc = Classified { matched: Vec::new(), unmatched: values };
            for branch in branches {
                let c = classify_by(acc.unmatched, branch, get)?;
                acc.matched.extend(c.matched);
                acc.unmatched = c.unmatched;
            }
            Ok(acc)
        }
        FindOperation::Simple(simple) => partition(values, get, |v| simple.matches(v)),
    }
}

fn partition<T, F, P>(values: Vec<T>, get: &F, mut pred: P) -> Result<Classified<T>>
where
    F: Fn(&T) -> &Value,
    P: FnMut(&Value) -> Result<bool>,
{
    let mut out = Classified::default();
    for v in values {
        if pred(get(&v))? {
            out.matched.push(v);
        } else {
            out.unmatched.push(v);
        }
    }
    Ok(out)
}

/// Documents matching `op`, in their original order.
///
/// # Errors
/// `UnsupportedOperator` when an unimplemented operator is reached.
pub fn retrieve(documents: &[Value], op: &FindOperation) -> Result<Vec<Value>> {
    let indexed: Vec<(usize, &Value)> = documents.iter().enumerate().collect();
    let mut matched = classify_by(indexed, op, &indexed_value)?.matched;
    matched.sort_unstable_by_key(|(i, _)| *i);
    Ok(matched.into_iter().map(|(_, doc)| doc.clone()).collect())
}

fn indexed_value<'b>(entry: &'b (usize, &Value)) -> &'b Value {
    entry.1
}

/// Classify values by a `$elemMatch`/`$pull` style operand: either a condition on the
/// value itself or a find operation over its fields.
///
/// # Errors
/// `UnsupportedOperator` when an unimplemented operator is reached.
pub fn classify_by_complex_find_operation<T: Borrow<Value>>(
    values: Vec<T>,
    op: &ComplexFindOperation,
) -> Result<Classified<T>> {
    match op {
        ComplexFindOperation::Condition(cond) => {
            partition(values, &|t: &T| <T as Borrow<Value>>::borrow(t), |v| cond.matches(v))
        }
        ComplexFindOperation::Find(find) => classify(values, find),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn docs(j: serde_json::Value) -> Vec<Value> {
        match Value::from(j) {
            Value::Array(items) => items.to_vec(),
            other => vec![other],
        }
    }

    fn op(j: serde_json::Value) -> FindOperation {
        FindOperation::try_from(&Value::from(j)).unwrap()
    }

    fn names(values: &[&Value]) -> Vec<String> {
        values
            .iter()
            .map(|v| v.as_map().and_then(|m| m.get("name")).and_then(Value::as_str).unwrap_or("").to_string())
            .collect()
    }

    fn people() -> Vec<Value> {
        docs(json!([
            {"name": "John", "age": 30, "sex": "male"},
            {"name": "Mary", "age": 25, "sex": "female"},
            {"name": "Mark", "age": 41, "sex": "male"},
            {"name": "Jane", "age": 12, "sex": "female"}
        ]))
    }

    #[test]
    fn simple_find_operation() {
        let all = docs(json!([{"dim_cm": 14}, {"dim_cm": 21}, {"dim_cm": 14}, {"dim_cm": 30}, {"dim_cm": 10}]));
        let found = retrieve(&all, &op(json!({"dim_cm": {"$gt": 21}}))).unwrap();
        assert_eq!(found, docs(json!([{"dim_cm": 30}])));
    }

    #[test]
    fn and_narrows() {
        let all = people();
        let c = classify(all.iter().collect(), &op(json!({"$and": [{"sex": "male"}, {"age": {"$gt": 35}}]})))
            .unwrap();
        assert_eq!(names(&c.matched), ["Mark"]);
        assert_eq!(names(&c.unmatched), ["Mary", "Jane", "John"]);
    }

    #[test]
    fn or_concatenates_branch_matches() {
        let all = people();
        let or = op(json!({"$or": [{"age": {"$gt": 35}}, {"age": {"$lt": 13}}, {"name": "John"}]}));
        let c = classify(all.iter().collect(), &or).unwrap();
        assert_eq!(names(&c.matched), ["Mark", "Jane", "John"]);
        let ordered = retrieve(&all, &or).unwrap();
        assert_eq!(names(&ordered.iter().collect::<Vec<_>>()), ["John", "Mark", "Jane"]);
    }

    #[test]
    fn nor_keeps_values_rejected_by_every_branch() {
        let all = people();
        let c = classify(all.iter().collect(), &op(json!({"$nor": [{"sex": "female"}, {"age": {"$gt": 35}}]})))
            .unwrap();
        assert_eq!(names(&c.matched), ["John"]);
        assert_eq!(c.unmatched.len(), 3);
    }

    #[test]
    fn and_wins_over_other_combinators() {
        let all = people();
        let mixed = op(json!({"$or": [{"name": "Jane"}], "$and": [{"name": "Mary"}]}));
        assert!(matches!(mixed, FindOperation::And(_)));
        let found = retrieve(&all, &mixed).unwrap();
        assert_eq!(names(&found.iter().collect::<Vec<_>>()), ["Mary"]);
    }

    #[test]
    fn nested_paths_and_missing_fields() {
        let all = docs(json!([{"a": {"b": [1, 2]}}, {"a": null}, {}]));
        assert_eq!(retrieve(&all, &op(json!({"a.b[1]": 2}))).unwrap().len(), 1);
        assert_eq!(retrieve(&all, &op(json!({"a": null}))).unwrap().len(), 1);
        assert_eq!(retrieve(&all, &op(json!({"a.b": {"$exists": true}}))).unwrap().len(), 1);
    }

    #[test]
    fn complex_operation_on_scalars_and_documents() {
        let scalars = docs(json!([1, 5, 8]));
        let cond = ComplexFindOperation::try_from(&Value::from(json!({"$gte": 5}))).unwrap();
        let c = classify_by_complex_find_operation(scalars.iter().collect(), &cond).unwrap();
        assert_eq!(c.matched.len(), 2);
        let find = ComplexFindOperation::try_from(&Value::from(json!({"name": "Mary"}))).unwrap();
        let c = classify_by_complex_find_operation(people(), &find).unwrap();
        assert_eq!(c.matched.len(), 1);
        assert_eq!(c.unmatched.len(), 3);
    }
}
