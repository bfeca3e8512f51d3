//! Payload field resolution
//!
//! Ingestion decides which payload keys hold the passage text and its origin
//! label, so the lookup order is configuration rather than code.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Which payload fields to read when formatting a hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PayloadSchema {
    /// Text fields in lookup order; the first one present wins
    pub text_fields: Vec<String>,
    pub source_field: String,
    /// Label used when the source field is absent
    pub default_source: String,
}

impl Default for PayloadSchema {
    fn default() -> Self {
        Self {
            text_fields: vec!["text".to_string(), "content".to_string()],
            source_field: "source".to_string(),
            default_source: "Unknown".to_string(),
        }
    }
}

impl PayloadSchema {
    /// Text of the first text field whose key exists.
    ///
    /// A present key wins over later fields even when it is empty or
    /// `null`; the hit then resolves to "" and is skipped by the assembler.
    pub fn resolve_text(&self, payload: &Map<String, JsonValue>) -> String {
        self.text_fields
            .iter()
            .find_map(|field| payload.get(field))
            .map(render_value)
            .unwrap_or_default()
    }

    /// Source label, or the configured default
    pub fn resolve_source(&self, payload: &Map<String, JsonValue>) -> String {
        present(payload, &self.source_field)
            .map(render_value)
            .unwrap_or_else(|| self.default_source.clone())
    }
}

fn present<'a>(payload: &'a Map<String, JsonValue>, field: &str) -> Option<&'a JsonValue> {
    payload.get(field).filter(|value| !value.is_null())
}

fn render_value(value: &JsonValue) -> String {
    match value {
        JsonValue::String(s) => s.clone(),
        JsonValue::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(value: JsonValue) -> Map<String, JsonValue> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_text_preferred_over_content() {
        let schema = PayloadSchema::default();
        let p = payload(json!({"text": "from text", "content": "from content"}));
        assert_eq!(schema.resolve_text(&p), "from text");
    }

    #[test]
    fn test_content_fallback() {
        let schema = PayloadSchema::default();
        let p = payload(json!({"content": "from content"}));
        assert_eq!(schema.resolve_text(&p), "from content");
    }

    #[test]
    fn test_empty_text_does_not_fall_back() {
        let schema = PayloadSchema::default();
        let p = payload(json!({"text": "", "content": "from content"}));
        assert_eq!(schema.resolve_text(&p), "");
    }

    #[test]
    fn test_null_text_does_not_fall_back() {
        let schema = PayloadSchema::default();
        let p = payload(json!({"text": null, "content": "from content"}));
        assert_eq!(schema.resolve_text(&p), "");
    }

    #[test]
    fn test_null_source_uses_default() {
        let schema = PayloadSchema::default();
        let p = payload(json!({"text": "chunk", "source": null}));
        assert_eq!(schema.resolve_source(&p), "Unknown");
    }

    #[test]
    fn test_missing_fields() {
        let schema = PayloadSchema::default();
        let p = payload(json!({"page": 4}));
        assert_eq!(schema.resolve_text(&p), "");
        assert_eq!(schema.resolve_source(&p), "Unknown");
    }

    #[test]
    fn test_non_string_source_is_rendered() {
        let schema = PayloadSchema::default();
        let p = payload(json!({"source": 12}));
        assert_eq!(schema.resolve_source(&p), "12");
    }

    #[test]
    fn test_custom_schema() {
        let schema = PayloadSchema {
            text_fields: vec!["body".to_string()],
            source_field: "url".to_string(),
            default_source: "n/a".to_string(),
        };
        let p = payload(json!({"body": "chunk", "text": "ignored"}));
        assert_eq!(schema.resolve_text(&p), "chunk");
        assert_eq!(schema.resolve_source(&p), "n/a");
    }
}
