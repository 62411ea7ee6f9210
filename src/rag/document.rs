//! Ingestion boundary: turning loosely shaped documents into `{text, ...}`.
//!
//! Source documents name their body differently (`text`, `data`, `content`,
//! `page_content`, `description`). The first alias holding a non-blank
//! string wins and is stored under the canonical `text` key; every other
//! field is kept as metadata. Downstream code only ever reads `text`.

use serde::{Deserialize, Serialize};

use crate::error::{RaglineError, Result};
use crate::vector::Metadata;

/// Canonical metadata key for a record's text.
pub const TEXT_FIELD: &str = "text";

/// Keys accepted as the document body, in priority order.
pub const TEXT_ALIASES: [&str; 5] = ["text", "data", "content", "page_content", "description"];

/// A document as submitted for ingestion: any JSON object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IngestDocument(Metadata);

/// A document whose text has been resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDocument {
    pub text: String,
    /// Metadata including the canonical `text` field.
    pub metadata: Metadata,
}

impl IngestDocument {
    pub fn new(fields: Metadata) -> Self {
        Self(fields)
    }

    /// Document with only a body.
    pub fn from_text(text: impl Into<String>) -> Self {
        let mut fields = Metadata::new();
        fields.insert(TEXT_FIELD.to_string(), text.into().into());
        Self(fields)
    }

    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn fields(&self) -> &Metadata {
        &self.0
    }

    /// Resolve the canonical text, failing if no alias holds any.
    pub fn resolve(self) -> Result<ResolvedDocument> {
        let mut fields = self.0;

        let alias = TEXT_ALIASES
            .iter()
            .find(|key| {
                fields
                    .get(**key)
                    .and_then(|value| value.as_str())
                    .is_some_and(|text| !text.trim().is_empty())
            })
            .ok_or_else(|| {
                RaglineError::invalid_document(format!(
                    "document has no text in any of: {}",
                    TEXT_ALIASES.join(", ")
                ))
            })?;

        let text = fields
            .remove(*alias)
            .and_then(|value| match value {
                serde_json::Value::String(text) => Some(text),
                _ => None,
            })
            .unwrap_or_default();
        fields.insert(TEXT_FIELD.to_string(), text.clone().into());

        Ok(ResolvedDocument {
            text,
            metadata: fields,
        })
    }
}

/// Read the canonical text back out of stored metadata.
pub fn text_of(metadata: &Metadata) -> &str {
    metadata
        .get(TEXT_FIELD)
        .and_then(|value| value.as_str())
        .unwrap_or("")
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn doc(value: serde_json::Value) -> IngestDocument {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_resolves_data_alias() {
        let resolved = doc(json!({"id": "a1", "data": "hello"})).resolve().unwrap();
        assert_eq!(resolved.text, "hello");
        assert_eq!(resolved.metadata, *doc(json!({"id": "a1", "text": "hello"})).fields());
    }

    #[test]
    fn test_alias_priority() {
        let resolved = doc(json!({"description": "short", "content": "long body"}))
            .resolve()
            .unwrap();
        assert_eq!(resolved.text, "long body");
        assert_eq!(resolved.metadata["description"], json!("short"));
        assert!(!resolved.metadata.contains_key("content"));
    }

    #[test]
    fn test_blank_alias_is_skipped() {
        let resolved = doc(json!({"text": "  ", "page_content": "body"}))
            .resolve()
            .unwrap();
        assert_eq!(resolved.text, "body");
    }

    #[test]
    fn test_missing_text_is_rejected() {
        let err = doc(json!({"title": "no body", "data": 42})).resolve().unwrap_err();
        assert!(matches!(err, RaglineError::InvalidDocument(_)));
    }

    #[test]
    fn test_non_object_does_not_deserialize() {
        assert!(serde_json::from_value::<IngestDocument>(json!("plain string")).is_err());
    }

    #[test]
    fn test_text_of() {
        let resolved = IngestDocument::from_text("body").with_field("k", 1).resolve().unwrap();
        assert_eq!(text_of(&resolved.metadata), "body");
        assert_eq!(text_of(&Metadata::new()), "");
    }
}
