use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

/// Key the platform attaches to every record to describe its type and URL.
pub const ATTRIBUTES_KEY: &str = "attributes";

/// Returned when an object cannot be rendered at all.
pub const OBJECT_SENTINEL: &str = "[Object]";

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace pattern is valid"));

/// Render one cell value as display text.
///
/// - null or missing -> `""`
/// - strings, numbers and booleans -> their text
/// - arrays -> `"[N items]"`
/// - objects -> `Name`, else `Label`, else `Id` when string-valued; `""` when
///   only the attributes marker (or nothing) is present; the single other
///   string-valued key if there is exactly one; compact JSON otherwise
pub fn normalize_value(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Array(items)) => format!("[{} items]", items.len()),
        Some(Value::Object(obj)) => normalize_object(obj),
    }
}

fn normalize_object(obj: &Map<String, Value>) -> String {
    for key in ["Name", "Label", "Id"] {
        if let Some(Value::String(s)) = obj.get(key) {
            return s.clone();
        }
    }

    if obj.keys().all(|k| k == ATTRIBUTES_KEY) {
        return String::new();
    }

    let mut readable = obj
        .iter()
        .filter(|(k, _)| k.as_str() != ATTRIBUTES_KEY)
        .filter_map(|(_, v)| v.as_str());
    if let (Some(only), None) = (readable.next(), readable.next()) {
        return only.to_string();
    }

    match serde_json::to_string(obj) {
        Ok(json) => WHITESPACE.replace_all(&json, " ").into_owned(),
        Err(_) => OBJECT_SENTINEL.to_string(),
    }
}

/// Follow a dotted path (`Account.Owner.Name`) by property descent.
/// Any missing or non-object hop yields `None`.
pub fn resolve_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(value, |current, part| current.as_object()?.get(part))
}
