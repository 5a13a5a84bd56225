use serde_json::Value;

/// Messages the tool reported as errors inside an otherwise valid document.
///
/// barman's JSON writer collects them under `_ERROR`; a bare top-level
/// `error` string is accepted as well.
pub fn tool_errors(payload: &Value) -> Vec<String> {
    let Some(obj) = payload.as_object() else {
        return vec![];
    };
    let mut messages = Vec::new();
    for key in ["_ERROR", "error"] {
        match obj.get(key) {
            Some(Value::String(s)) if !s.trim().is_empty() => messages.push(s.clone()),
            Some(Value::Array(items)) => messages.extend(
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .filter(|s| !s.trim().is_empty())
                    .map(|s| s.to_string()),
            ),
            _ => {}
        }
    }
    messages
}

/// Non-fatal notices (`_WARNING`, `_INFO`) shown alongside a result.
pub fn tool_notices(payload: &Value) -> Vec<String> {
    let Some(obj) = payload.as_object() else {
        return vec![];
    };
    ["_WARNING", "_INFO"]
        .iter()
        .filter_map(|key| obj.get(*key))
        .flat_map(|v| match v {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|i| i.as_str().map(|s| s.to_string()))
                .collect(),
            _ => vec![],
        })
        .collect()
}
