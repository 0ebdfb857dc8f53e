#![no_main]
use libfuzzer_sys::fuzz_target;
use serde_json::json;

fuzz_target!(|data: &[u8]| {
    if data.len() > 8192 {
        return;
    }
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(find) = docops::query::parse_find_json(s) {
            // A few shapes to reach the comparison and array branches
            let docs = [
                docops::Value::from(json!({"a": 1, "b": 2, "name": "x"})),
                docops::Value::from(json!({"a": 10, "b": -5, "name": "y", "nested": {"z": [3, 4]}})),
                docops::Value::from(json!({"active": true, "tags": ["p", "q"]})),
            ];
            let _ = docops::retrieve(&docs, &find);
        }
    }
});
