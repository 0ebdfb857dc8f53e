use docops::query::parse_find_json;
use docops::update::{merge_update_operations, parse_update_json};
use docops::{Value, retrieve, update, validate_update_operation};
use serde_json::json;

fn inventory() -> Vec<Value> {
    match Value::from(json!([
        {"sku": "a1", "qty": 5, "tags": ["red"], "dim": {"h": 10, "w": 2}},
        {"sku": "b2", "qty": 0, "tags": ["blue", "red"], "dim": {"h": 4, "w": 4}},
        {"sku": "c3", "qty": 12, "tags": [], "dim": {"h": 30, "w": 1}}
    ])) {
        Value::Array(items) => items.to_vec(),
        _ => Vec::new(),
    }
}

#[test]
fn restock_red_items() {
    let docs = inventory();
    let red = retrieve(&docs, &parse_find_json(r#"{"tags": "red", "qty": {"$lt": 10}}"#).unwrap()).unwrap();
    assert_eq!(red.len(), 2);

    let op = merge_update_operations(&[
        parse_update_json(r#"{"$inc": {"qty": 10}}"#).unwrap(),
        parse_update_json(r#"{"$inc": {"qty": 5}, "$addToSet": {"tags": "restocked"}}"#).unwrap(),
    ])
    .unwrap();
    assert!(validate_update_operation(&op).valid);
    let pull = parse_update_json(r#"{"$pull": {"tags": "blue"}}"#).unwrap();

    let ops = [op, pull];
    let updated: Vec<Value> = red.iter().map(|d| update(d, &ops).unwrap()).collect();
    assert_eq!(
        updated,
        vec![
            Value::from(json!({"sku": "a1", "qty": 20, "tags": ["red", "restocked"], "dim": {"h": 10, "w": 2}})),
            Value::from(json!({"sku": "b2", "qty": 15, "tags": ["red", "restocked"], "dim": {"h": 4, "w": 4}})),
        ]
    );
    // the source documents are untouched
    assert_eq!(docs, inventory());
}

#[test]
fn trace_follows_operator_order() {
    let _sink = docops::trace::enable_thread_sink();
    let doc = Value::from(json!({"n": 1, "old": true}));
    let op = parse_update_json(r#"{"$unset": {"old": ""}, "$inc": {"n": 1}, "$currentDate": {"at": true}}"#).unwrap();
    let out = update(&doc, &[op]).unwrap();
    assert_eq!(docops::trace::drain(), ["$unset old", "$inc n", "$currentDate at"]);
    let m = out.as_map().unwrap();
    assert!(!m.contains_key("old"));
    assert_eq!(m.get("n"), Some(&Value::Int(2)));
}
