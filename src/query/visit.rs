use crate::value::{Map, Value};

use super::types::{Clause, ComplexFindOperation, FieldCondition, FindOperation, QueryCondition, SimpleFindOperation};

/// Hooks for rewriting a find operation. Both default to the identity.
pub trait FindOperationVisitor {
    fn simple_find_operation(&mut self, op: SimpleFindOperation) -> SimpleFindOperation {
        op
    }

    fn query_condition(&mut self, condition: QueryCondition) -> QueryCondition {
        condition
    }
}

/// Rebuild `op` with the visitor applied to every simple operation and to every
/// field condition, including the condition nested under `$not`.
pub fn visit_find_operation<V: FindOperationVisitor + ?Sized>(op: &FindOperation, visitor: &mut V) -> FindOperation {
    match op {
        FindOperation::And(ops) => FindOperation::And(visit_all(ops, visitor)),
        FindOperation::Nor(ops) => FindOperation::Nor(visit_all(ops, visitor)),
        FindOperation::Or(ops) => FindOperation::Or(visit_all(ops, visitor)),
        FindOperation::Simple(simple) => FindOperation::Simple(visit_simple(simple.clone(), visitor)),
    }
}

fn visit_all<V: FindOperationVisitor + ?Sized>(ops: &[FindOperation], visitor: &mut V) -> Vec<FindOperation> {
    ops.iter().map(|o| visit_find_operation(o, visitor)).collect()
}

fn visit_simple<V: FindOperationVisitor + ?Sized>(simple: SimpleFindOperation, visitor: &mut V) -> SimpleFindOperation {
    let simple = visitor.simple_find_operation(simple);
    let fields = simple
        .fields
        .into_iter()
        .map(|field| {
            let negated = field.condition.clauses.iter().find_map(|c| match c {
                Clause::Not(inner) => Some((**inner).clone()),
                _ => None,
            });
            let mut condition = visitor.query_condition(field.condition);
            if let Some(inner) = negated {
                let visited = Clause::Not(Box::new(visitor.query_condition(inner)));
                match condition.clauses.iter_mut().find(|c| matches!(c, Clause::Not(_))) {
                    Some(slot) => *slot = visited,
                    None => condition.clauses.push(visited),
                }
            }
            FieldCondition { condition, ..field }
        })
        .collect();
    SimpleFindOperation { fields }
}

impl QueryCondition {
    /// Condition as a value; a string-given `$regex` renders as its pattern.
    #[must_use]
    pub fn to_value(&self) -> Value {
        let mut m = Map::new();
        for clause in &self.clauses {
            let (key, operand) = match clause {
                Clause::Compare(op, v) => (op.as_str(), v.clone()),
                Clause::In(vs) => ("$in", Value::array(vs.clone())),
                Clause::Nin(vs) => ("$nin", Value::array(vs.clone())),
                Clause::Not(inner) => ("$not", inner.to_value()),
                Clause::Exists(b) => ("$exists", Value::Bool(*b)),
                Clause::Type(t) => ("$type", Value::from(t.name())),
                Clause::Mod { divisor, remainder } => {
                    ("$mod", Value::array(vec![num_value(*divisor), num_value(*remainder)]))
                }
                Clause::Regex { regex, native: true } => ("$regex", Value::Regex(regex.clone())),
                Clause::Regex { regex, native: false } => ("$regex", Value::from(regex.pattern())),
                Clause::Options(flags) => ("$options", Value::from(flags.as_str())),
                Clause::All(vs) => ("$all", Value::array(vs.clone())),
                Clause::ElemMatch(op) => ("$elemMatch", op.to_value()),
                Clause::Size(n) => ("$size", Value::Int(crate::num::usize_to_i64_saturating(*n))),
                Clause::Unsupported(op) => (op.as_str(), Value::Null),
            };
            m.insert(key.to_string(), operand);
        }
        Value::object(m)
    }
}

fn num_value(f: f64) -> Value {
    crate::num::f64_to_i64_exact(f).map_or(Value::Double(f), Value::Int)
}

impl SimpleFindOperation {
    #[must_use]
    pub fn to_value(&self) -> Value {
        Value::object(self.fields.iter().map(|f| (f.path.clone(), f.condition.to_value())).collect())
    }
}

impl FindOperation {
    #[must_use]
    pub fn to_value(&self) -> Value {
        let tagged = |key: &str, ops: &[FindOperation]| {
            let mut m = Map::new();
            m.insert(key.to_string(), Value::array(ops.iter().map(FindOperation::to_value).collect()));
            Value::object(m)
        };
        match self {
            Self::And(ops) => tagged("$and", ops),
            Self::Nor(ops) => tagged("$nor", ops),
            Self::Or(ops) => tagged("$or", ops),
            Self::Simple(simple) => simple.to_value(),
        }
    }
}

impl ComplexFindOperation {
    #[must_use]
    pub fn to_value(&self) -> Value {
        match self {
            Self::Condition(c) => c.to_value(),
            Self::Find(f) => f.to_value(),
        }
    }
}

struct RegexToJson;

impl FindOperationVisitor for RegexToJson {
    fn query_condition(&mut self, mut condition: QueryCondition) -> QueryCondition {
        let mut flags = None;
        for clause in &mut condition.clauses {
            if let Clause::Regex { regex, native } = clause
                && *native
            {
                *native = false;
                if !regex.flags().is_empty() {
                    flags = Some(regex.flags().to_string());
                }
            }
        }
        if let Some(flags) = flags {
            match condition.clauses.iter_mut().find(|c| matches!(c, Clause::Options(_))) {
                Some(slot) => *slot = Clause::Options(flags),
                None => condition.clauses.push(Clause::Options(flags)),
            }
        }
        condition
    }
}

/// JSON-safe form of a find operation: native regexes become `$regex` pattern strings
/// with their flags under `$options`.
#[must_use]
pub fn find_operation_to_value(op: &FindOperation) -> Value {
    visit_find_operation(op, &mut RegexToJson).to_value()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn op(j: serde_json::Value) -> FindOperation {
        FindOperation::try_from(&Value::from(j)).unwrap()
    }

    struct Upper;

    impl FindOperationVisitor for Upper {
        fn query_condition(&mut self, mut condition: QueryCondition) -> QueryCondition {
            for clause in &mut condition.clauses {
                if let Clause::Compare(_, Value::String(s)) = clause {
                    *s = s.to_uppercase();
                }
            }
            condition
        }
    }

    #[test]
    fn visitor_reaches_nested_conditions_and_not() {
        let visited = visit_find_operation(
            &op(json!({"$or": [{"name": "ann"}, {"tag": {"$not": {"$eq": "x"}}}]})),
            &mut Upper,
        );
        assert_eq!(
            visited.to_value(),
            Value::from(json!({"$or": [{"name": {"$eq": "ANN"}}, {"tag": {"$not": {"$eq": "X"}}}]}))
        );
    }

    #[test]
    fn regex_renders_as_pattern_and_options() {
        let mut m = Map::new();
        m.insert("name".into(), Value::regex("^jo", "i").unwrap());
        let find = FindOperation::try_from(&Value::object(m)).unwrap();
        assert_eq!(
            find_operation_to_value(&find),
            Value::from(json!({"name": {"$regex": "^jo", "$options": "i"}}))
        );
    }

    #[test]
    fn string_patterns_pass_through() {
        let find = op(json!({"name": {"$regex": "^jo", "$options": "m"}, "age": {"$mod": [2, 0]}}));
        assert_eq!(
            find_operation_to_value(&find),
            Value::from(json!({"name": {"$regex": "^jo", "$options": "m"}, "age": {"$mod": [2, 0]}}))
        );
    }
}
