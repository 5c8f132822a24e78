use serde_json::{Map, Value};

/// Key answer fields in order of priority.
const PRIORITY_KEYS: [&str; 5] = ["financed", "level_payment", "residual_balance", "lump_sum", "amount"];

/// Print just the key answer value from the output.
///
/// Heuristic: look for well-known result fields, first on the result object
/// and then one level down (`financing`, `schedule`), falling back to the
/// first field of the result.
pub fn print_minimal(value: &Value) {
    let result_obj = value
        .as_object()
        .and_then(|m| m.get("result"))
        .unwrap_or(value);

    if let Value::Object(map) = result_obj {
        if let Some(val) = find_priority(map) {
            println!("{}", format_minimal(val));
            return;
        }

        if let Some((key, val)) = map.iter().next() {
            println!("{}: {}", key, format_minimal(val));
            return;
        }
    }

    println!("{}", format_minimal(result_obj));
}

fn find_priority(map: &Map<String, Value>) -> Option<&Value> {
    find_direct(map).or_else(|| {
        map.values()
            .filter_map(|v| v.as_object())
            .find_map(find_direct)
    })
}

fn find_direct(map: &Map<String, Value>) -> Option<&Value> {
    PRIORITY_KEYS
        .iter()
        .filter_map(|key| map.get(*key))
        .find(|val| !val.is_null())
}

fn format_minimal(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => "null".to_string(),
        _ => serde_json::to_string(value).unwrap_or_default(),
    }
}
