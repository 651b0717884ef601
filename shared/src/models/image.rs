//! Image reference normalization
//!
//! Listing images arrive either as bare URL strings or as objects carrying
//! the URL (`{"url": ...}`, `{"uri": ...}`, upload-service shapes with
//! `secure_url`). The cache only ever holds the URL string; empty or
//! unrecognized entries are dropped.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

const URL_KEYS: &[&str] = &["url", "uri", "secure_url", "src"];

/// Normalize a single image value to its URL form
pub fn normalize_image(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => non_empty(s),
        Value::Object(map) => URL_KEYS
            .iter()
            .find_map(|key| map.get(*key).and_then(Value::as_str))
            .and_then(non_empty),
        _ => None,
    }
}

/// Normalize an image field that may be a list, a single entry, or null
pub fn normalize_images(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(normalize_image).collect(),
        Value::Null => Vec::new(),
        single => normalize_image(single).into_iter().collect(),
    }
}

/// Drop blank entries from an outgoing image list
pub fn clean_image_urls(urls: &mut Vec<String>) {
    urls.retain_mut(|url| {
        let trimmed = url.trim();
        if trimmed.len() != url.len() {
            *url = trimmed.to_string();
        }
        !url.is_empty()
    });
}

/// serde helper for `images` fields
pub fn deserialize_images<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(normalize_images).unwrap_or_default())
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_mixed_image_shapes() {
        let raw = json!([
            "https://cdn/a.jpg",
            {"url": "https://cdn/b.jpg"},
            {"uri": "file:///c.jpg"},
            {"secure_url": "https://cdn/d.jpg"},
            "",
            "   ",
            {"url": ""},
            {"width": 10},
            42,
            null
        ]);
        assert_eq!(
            normalize_images(&raw),
            vec![
                "https://cdn/a.jpg",
                "https://cdn/b.jpg",
                "file:///c.jpg",
                "https://cdn/d.jpg"
            ]
        );
    }

    #[test]
    fn test_single_and_null() {
        assert_eq!(normalize_images(&json!("x.png")), vec!["x.png"]);
        assert!(normalize_images(&Value::Null).is_empty());
    }

    #[test]
    fn test_clean_outgoing_urls() {
        let mut urls = vec![" a.png ".to_string(), "".to_string(), "b.png".to_string()];
        clean_image_urls(&mut urls);
        assert_eq!(urls, vec!["a.png", "b.png"]);
    }
}
