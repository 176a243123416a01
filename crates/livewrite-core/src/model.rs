// ── Records ──
//
// Anything a wrapper can hold: a keyed structure decoded from the
// backend's JSON. The API models implement it, and so does raw JSON for
// schemaless use.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::CoreError;

pub use livewrite_api::models::{Document, File, User};

/// A keyed record decoded from a backend payload.
///
/// The identifier is the backend's `$id`. List wrappers keep at most one
/// copy of each identifier.
///
/// ```rust,ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct Post {
///     #[serde(rename = "$id")]
///     id: String,
///     title: String,
/// }
///
/// impl Record for Post {
///     fn record_id(&self) -> &str {
///         &self.id
///     }
/// }
/// ```
pub trait Record: DeserializeOwned + Serialize + Clone + Send + Sync + 'static {
    fn record_id(&self) -> &str;
}

impl Record for Document {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for File {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for User {
    fn record_id(&self) -> &str {
        &self.id
    }
}

impl Record for Value {
    fn record_id(&self) -> &str {
        self.get("$id").and_then(Value::as_str).unwrap_or_default()
    }
}

/// Decode a JSON payload into a record.
pub(crate) fn decode<T: Record>(value: &Value) -> Result<T, CoreError> {
    Ok(T::deserialize(value)?)
}

/// Decode a page of payloads, failing on the first bad one.
pub(crate) fn decode_all<T: Record>(values: &[Value]) -> Result<Vec<T>, CoreError> {
    values.iter().map(decode).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_record_reads_dollar_id() {
        let value = json!({ "$id": "abc", "title": "x" });
        assert_eq!(value.record_id(), "abc");
        assert_eq!(json!({ "title": "x" }).record_id(), "");
    }

    #[test]
    fn decode_document() {
        let doc: Document = decode(&json!({ "$id": "d1", "title": "Hello" })).unwrap();
        assert_eq!(doc.record_id(), "d1");
        assert_eq!(doc.get("title"), Some(&json!("Hello")));
    }

    #[test]
    fn decode_failure_is_decode_error() {
        let result: Result<File, _> = decode(&json!({ "name": "no id" }));
        assert!(matches!(result, Err(CoreError::Decode { .. })));
    }
}
