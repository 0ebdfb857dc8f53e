use docops::query::{
    Classified, ComplexFindOperation, FindOperation, QueryCondition, classify, classify_by_complex_find_operation,
    find_operation_to_value, parse_condition_json, parse_find_json,
};
use docops::{DocError, Value, check_condition, normalize_query_condition, retrieve};
use serde_json::json;

fn v(j: serde_json::Value) -> Value {
    Value::from(j)
}

fn docs(j: serde_json::Value) -> Vec<Value> {
    v(j).as_array().map(<[Value]>::to_vec).unwrap_or_default()
}

#[test]
fn normalization_examples() {
    assert_eq!(normalize_query_condition(&Value::Null), v(json!({"$eq": null})));
    assert_eq!(normalize_query_condition(&Value::Undefined), v(json!({"$eq": null})));
    assert_eq!(normalize_query_condition(&v(json!("foo"))), v(json!({"$eq": "foo"})));
    assert_eq!(normalize_query_condition(&v(json!({}))), v(json!({})));
    assert_eq!(normalize_query_condition(&v(json!({"a": 1, "$eq": 2}))), v(json!({"$eq": {"a": 1, "$eq": 2}})));
    assert_eq!(normalize_query_condition(&v(json!([1, 2]))), v(json!({"$eq": [1, 2]})));
}

#[test]
fn retrieve_dim_cm() {
    let all = docs(json!([{"dim_cm": 14}, {"dim_cm": 21}, {"dim_cm": 14}, {"dim_cm": 30}, {"dim_cm": 10}]));
    let found = retrieve(&all, &parse_find_json(r#"{"dim_cm": {"$gt": 21}}"#).unwrap()).unwrap();
    assert_eq!(found, docs(json!([{"dim_cm": 30}])));
}

#[test]
fn array_field_compared_per_element() {
    let doc = v(json!({"dim_cm": [14, 21]}));
    let gt = parse_find_json(r#"{"dim_cm": {"$gt": 21}}"#).unwrap();
    let gte = parse_find_json(r#"{"dim_cm": {"$gte": 21}}"#).unwrap();
    assert!(retrieve(std::slice::from_ref(&doc), &gt).unwrap().is_empty());
    assert_eq!(retrieve(std::slice::from_ref(&doc), &gte).unwrap().len(), 1);
}

#[test]
fn null_condition_does_not_match_missing_field() {
    let all = docs(json!([{"a": null}, {"b": 1}]));
    let found = retrieve(&all, &parse_find_json(r#"{"a": null}"#).unwrap()).unwrap();
    assert_eq!(found, docs(json!([{"a": null}])));
    let missing = retrieve(&all, &parse_find_json(r#"{"a": {"$exists": false}}"#).unwrap()).unwrap();
    assert_eq!(missing.len(), 2);
}

#[test]
fn combinators_and_classification() {
    let all = docs(json!([
        {"name": "a", "n": 1},
        {"name": "b", "n": 2},
        {"name": "c", "n": 3}
    ]));
    let op = parse_find_json(r#"{"$nor": [{"n": 1}, {"name": "c"}]}"#).unwrap();
    let Classified { matched, unmatched } = classify(all.clone(), &op).unwrap();
    assert_eq!(matched, docs(json!([{"name": "b", "n": 2}])));
    assert_eq!(unmatched.len(), 2);

    let or = parse_find_json(r#"{"$or": [{"n": {"$gte": 3}}, {"name": {"$in": ["a"]}}]}"#).unwrap();
    assert_eq!(retrieve(&all, &or).unwrap(), docs(json!([{"name": "a", "n": 1}, {"name": "c", "n": 3}])));
}

#[test]
fn elem_match_on_documents() {
    let all = docs(json!([
        {"items": [{"sku": "x", "qty": 1}, {"sku": "y", "qty": 8}]},
        {"items": [{"sku": "x", "qty": 9}]}
    ]));
    let op = parse_find_json(r#"{"items": {"$elemMatch": {"sku": "x", "qty": {"$gt": 5}}}}"#).unwrap();
    assert_eq!(retrieve(&all, &op).unwrap().len(), 1);
}

#[test]
fn complex_operation_dispatch() {
    let scalars = docs(json!([1, "two", 3]));
    let by_type = ComplexFindOperation::try_from(&v(json!({"$type": "string"}))).unwrap();
    let c = classify_by_complex_find_operation(scalars, &by_type).unwrap();
    assert_eq!(c.matched, docs(json!(["two"])));
    assert!(matches!(
        ComplexFindOperation::try_from(&v(json!({"name": "x"}))).unwrap(),
        ComplexFindOperation::Find(FindOperation::Simple(_))
    ));
    assert!(matches!(
        ComplexFindOperation::try_from(&Value::regex("^a", "").unwrap()).unwrap(),
        ComplexFindOperation::Condition(_)
    ));
}

#[test]
fn operator_errors() {
    assert!(matches!(parse_condition_json(r#"{"$bogus": 1}"#), Err(DocError::UnknownOperator(op)) if op == "$bogus"));
    assert!(matches!(parse_condition_json(r#"{"$in": 1}"#), Err(DocError::InvalidOperand { .. })));
    assert!(matches!(
        check_condition(&v(json!("x")), &v(json!({"$text": {"$search": "x"}}))),
        Err(DocError::UnsupportedOperator(_))
    ));
    assert!(matches!(parse_find_json("[]"), Err(DocError::InvalidOperand { .. })));
    assert!(matches!(parse_find_json("{"), Err(DocError::Json(_))));
}

#[test]
fn condition_and_find_render_back() {
    let cond = QueryCondition::try_from(&v(json!(5))).unwrap();
    assert_eq!(cond.to_value(), v(json!({"$eq": 5})));
    let find = parse_find_json(r#"{"$and": [{"a": {"$size": 2}}, {"b": {"$nin": [1]}}]}"#).unwrap();
    assert_eq!(find_operation_to_value(&find), v(json!({"$and": [{"a": {"$size": 2}}, {"b": {"$nin": [1]}}]})));
}
