//! Image Reference Model
//!
//! Two historical shapes are stored for an image:
//!
//! | Shape | Example | Written by |
//! |-------|---------|------------|
//! | bare URL | `"https://cdn/x.jpg"` | oldest profile/menu forms |
//! | object | `{"url": "https://cdn/x.jpg", "path": "restaurants/r1/1700-x.jpg"}` | current uploads |
//!
//! Restaurants may additionally carry the value under the deprecated
//! `restaurantImage` field. [`normalize_image`] is the single place that
//! reconciles all of these into one optional URL.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Stored image pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    /// Object-store upload: `url` is fetchable, `path` is the object key
    Stored {
        url: String,
        #[serde(default)]
        path: String,
    },
    /// Bare URL (oldest format)
    Url(String),
}

impl ImageRef {
    /// Externally fetchable address
    pub fn url(&self) -> &str {
        match self {
            ImageRef::Stored { url, .. } => url,
            ImageRef::Url(url) => url,
        }
    }

    /// Object-store key, if the image was uploaded through the object store
    pub fn path(&self) -> Option<&str> {
        match self {
            ImageRef::Stored { path, .. } if !path.is_empty() => Some(path),
            _ => None,
        }
    }

    /// Lenient parse of a stored value. Never fails; unusable shapes yield `None`.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(url) if !url.is_empty() => Some(ImageRef::Url(url.clone())),
            Value::Object(map) => {
                let url = map.get("url").and_then(Value::as_str).filter(|u| !u.is_empty())?;
                let path = map.get("path").and_then(Value::as_str).unwrap_or_default();
                Some(ImageRef::Stored {
                    url: url.to_string(),
                    path: path.to_string(),
                })
            }
            _ => None,
        }
    }

    /// Representation written to the document store
    pub fn to_value(&self) -> Value {
        match self {
            ImageRef::Stored { url, path } => serde_json::json!({ "url": url, "path": path }),
            ImageRef::Url(url) => Value::String(url.clone()),
        }
    }
}

/// Reconcile a stored image field and its legacy fallback into one URL.
///
/// `primary` wins when it is a non-empty string or an object with a
/// non-empty string `url`; otherwise the same checks run on
/// `legacy_fallback`. Any other shape (missing, null, number, empty string,
/// object without `url`) yields `None`. Total over all JSON input.
pub fn normalize_image(primary: &Value, legacy_fallback: &Value) -> Option<String> {
    image_url(primary)
        .or_else(|| image_url(legacy_fallback))
        .map(str::to_string)
}

fn image_url(value: &Value) -> Option<&str> {
    match value {
        Value::String(url) if !url.is_empty() => Some(url),
        Value::Object(map) => map
            .get("url")
            .and_then(Value::as_str)
            .filter(|url| !url.is_empty()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn shapes() -> Vec<Value> {
        vec![
            json!("https://img/a.jpg"),
            json!(""),
            json!({ "url": "https://img/b.jpg", "path": "restaurants/r1/b.jpg" }),
            json!({ "url": "" }),
            json!({ "url": 42 }),
            json!({}),
            json!([]),
            json!(["https://img/c.jpg"]),
            Value::Null,
            json!(17),
            json!(true),
        ]
    }

    #[test]
    fn normalize_is_total_over_every_shape_pair() {
        for primary in shapes() {
            for fallback in shapes() {
                let out = normalize_image(&primary, &fallback);
                if let Some(url) = out {
                    assert!(!url.is_empty());
                }
            }
        }
    }

    #[test]
    fn primary_string_wins_over_fallback() {
        assert_eq!(
            normalize_image(&json!("a"), &json!({ "url": "b" })),
            Some("a".to_string())
        );
    }

    #[test]
    fn null_primary_falls_back_to_legacy_object() {
        assert_eq!(
            normalize_image(&Value::Null, &json!({ "url": "b" })),
            Some("b".to_string())
        );
    }

    #[test]
    fn empty_objects_yield_none() {
        assert_eq!(normalize_image(&json!({}), &json!({})), None);
    }

    #[test]
    fn primary_object_url_is_used() {
        let primary = json!({ "url": "https://img/x.jpg", "path": "restaurants/r1/x.jpg" });
        assert_eq!(
            normalize_image(&primary, &json!("https://img/legacy.jpg")),
            Some("https://img/x.jpg".to_string())
        );
    }

    #[test]
    fn empty_primary_string_is_skipped() {
        assert_eq!(
            normalize_image(&json!(""), &json!("https://img/legacy.jpg")),
            Some("https://img/legacy.jpg".to_string())
        );
    }

    #[test]
    fn from_value_keeps_upload_path() {
        let image = ImageRef::from_value(&json!({ "url": "u", "path": "p" })).unwrap();
        assert_eq!(image.url(), "u");
        assert_eq!(image.path(), Some("p"));
        assert_eq!(ImageRef::from_value(&json!("u")), Some(ImageRef::Url("u".into())));
        assert_eq!(ImageRef::from_value(&json!(3)), None);
    }

    #[test]
    fn deserializes_both_shapes() {
        let stored: ImageRef = serde_json::from_value(json!({ "url": "u", "path": "p" })).unwrap();
        assert_eq!(stored.path(), Some("p"));
        let bare: ImageRef = serde_json::from_value(json!("u")).unwrap();
        assert_eq!(bare, ImageRef::Url("u".into()));
    }
}
