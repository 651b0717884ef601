//! Response payload extraction
//!
//! The backend is not consistent about envelopes: a collection may arrive as
//! a bare array, under `data`, or under a resource key (`departments`,
//! `reservations`, ...). Missing or malformed data is treated as "no data"
//! rather than a crash.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{ClientError, ClientResult};

/// Unwrap a `{ "data": ... }` envelope
pub fn unwrap_data(body: Value) -> Value {
    match body {
        Value::Object(mut map) if map.contains_key("data") => {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Locate a list: bare array, `data`, or the first matching resource key
pub fn extract_list(body: Value, keys: &[&str]) -> Option<Vec<Value>> {
    match unwrap_data(body) {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => keys.iter().find_map(|key| match map.remove(*key) {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        }),
        _ => None,
    }
}

/// Locate a single entity: a resource key holding an object, or the body
/// itself when it carries an id
pub fn extract_entity(body: Value, keys: &[&str]) -> Option<Value> {
    let body = unwrap_data(body);
    let Value::Object(map) = &body else {
        return None;
    };
    for key in keys {
        if let Some(entity @ Value::Object(_)) = map.get(*key) {
            return Some(entity.clone());
        }
    }
    if map.contains_key("id") || map.contains_key("_id") {
        return Some(body);
    }
    None
}

/// Decode every list item, skipping the ones that do not fit `T`
pub fn decode_list<T: DeserializeOwned>(items: Vec<Value>, resource: &str) -> Vec<T> {
    let total = items.len();
    let decoded: Vec<T> = items
        .into_iter()
        .filter_map(|item| match serde_json::from_value(item) {
            Ok(entity) => Some(entity),
            Err(e) => {
                tracing::warn!(resource, error = %e, "Skipping malformed item");
                None
            }
        })
        .collect();
    if decoded.len() != total {
        tracing::debug!(resource, kept = decoded.len(), total, "Partially decoded list");
    }
    decoded
}

/// Extract and decode a collection response
pub fn list_of<T: DeserializeOwned>(
    body: Value,
    keys: &[&str],
    resource: &str,
) -> ClientResult<Vec<T>> {
    let items = extract_list(body, keys).ok_or_else(|| {
        ClientError::InvalidResponse(format!("{} response carried no list", resource))
    })?;
    Ok(decode_list(items, resource))
}

/// Extract and decode a single-entity response, `None` when absent
pub fn entity_of<T: DeserializeOwned>(body: Value, keys: &[&str]) -> Option<T> {
    extract_entity(body, keys).and_then(|entity| serde_json::from_value(entity).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Item {
        id: u32,
    }

    #[test]
    fn test_list_shapes() {
        let keys = ["departments"];
        assert_eq!(extract_list(json!([1, 2]), &keys).unwrap().len(), 2);
        assert_eq!(extract_list(json!({"data": [1]}), &keys).unwrap().len(), 1);
        assert_eq!(
            extract_list(json!({"departments": [1, 2, 3]}), &keys).unwrap().len(),
            3
        );
        assert_eq!(
            extract_list(json!({"data": {"departments": [1]}}), &keys).unwrap().len(),
            1
        );
        assert!(extract_list(json!({"other": []}), &keys).is_none());
        assert!(extract_list(Value::Null, &keys).is_none());
    }

    #[test]
    fn test_entity_shapes() {
        let keys = ["department"];
        assert!(extract_entity(json!({"id": 1}), &keys).is_some());
        assert!(extract_entity(json!({"_id": "a"}), &keys).is_some());
        assert_eq!(
            extract_entity(json!({"message": "ok", "department": {"id": 3}}), &keys),
            Some(json!({"id": 3}))
        );
        assert!(extract_entity(json!({"message": "created"}), &keys).is_none());
    }

    #[test]
    fn test_decode_skips_malformed() {
        let items: Vec<Item> = decode_list(
            vec![json!({"id": 1}), json!("junk"), json!({"id": 2})],
            "items",
        );
        assert_eq!(items, vec![Item { id: 1 }, Item { id: 2 }]);
    }

    #[test]
    fn test_list_of_missing_list_is_invalid_response() {
        let result: ClientResult<Vec<Item>> =
            list_of(json!({"message": "ok"}), &["items"], "items");
        assert!(matches!(result, Err(ClientError::InvalidResponse(_))));
    }
}
