//! JSON API documents: item extraction and field lookup through pointers.

use infoia_core::JsonMapping;
use serde_json::Value;

use crate::error::FetchError;

/// Parse a response body and return the item array selected by `mapping.items`.
///
/// # Errors
///
/// Returns [`FetchError::Malformed`] if the body is not JSON or the pointer
/// does not select an array.
pub(crate) fn split_items(body: &str, mapping: &JsonMapping) -> Result<Vec<Value>, FetchError> {
    let doc: Value = serde_json::from_str(body).map_err(|e| FetchError::Malformed {
        format: "json",
        reason: e.to_string(),
    })?;

    match doc.pointer(&mapping.items) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(other) => Err(FetchError::Malformed {
            format: "json",
            reason: format!(
                "'{}' selects a {} instead of an array",
                mapping.items,
                kind_of(other)
            ),
        }),
        None => Err(FetchError::Malformed {
            format: "json",
            reason: format!("'{}' does not exist in the document", mapping.items),
        }),
    }
}

/// String value at `pointer`. Numbers are rendered; empty strings count as absent.
pub(crate) fn string_at(item: &Value, pointer: &str) -> Option<String> {
    match item.pointer(pointer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Author value at `pointer`: a string, or a list of names / `{name}` objects.
///
/// Lists are shortened to the first three names followed by `et al.`.
pub(crate) fn authors_at(item: &Value, pointer: &str) -> Option<String> {
    match item.pointer(pointer)? {
        Value::Array(list) => {
            let names: Vec<&str> = list
                .iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s.as_str()),
                    Value::Object(o) => o.get("name").and_then(Value::as_str),
                    _ => None,
                })
                .filter(|s| !s.trim().is_empty())
                .collect();
            if names.is_empty() {
                return None;
            }
            let mut joined = names.iter().take(3).copied().collect::<Vec<_>>().join(", ");
            if names.len() > 3 {
                joined.push_str(" et al.");
            }
            Some(joined)
        }
        _ => string_at(item, pointer),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
