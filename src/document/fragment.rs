//! Fragment: the atomic unit of stored text

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// The composite identity of a fragment.
///
/// The triple `(document, handle, language)` is the unique primary key
/// across all fragments in a store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FragmentKey {
    /// Owning document name
    pub document: String,
    /// Caller-chosen identifier, unique within `(document, language)`
    pub handle: String,
    /// Language/variant tag
    pub language: String,
}

impl FragmentKey {
    pub fn new(
        document: impl Into<String>,
        handle: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            handle: handle.into(),
            language: language.into(),
        }
    }
}

impl fmt::Display for FragmentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}@{}", self.document, self.handle, self.language)
    }
}

/// A stored text unit plus metadata.
///
/// Identity lives in `document`, `handle` and `language`; upsert replaces
/// `title`, `text` and `metadata` while preserving the key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub document: String,
    pub handle: String,
    pub language: String,
    /// Optional display label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Optional body content
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    /// Optional structured metadata (string keys, arbitrary JSON values)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl Fragment {
    /// Create a fragment with an empty payload
    pub fn new(
        document: impl Into<String>,
        handle: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            document: document.into(),
            handle: handle.into(),
            language: language.into(),
            title: None,
            text: None,
            metadata: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn with_metadata(mut self, metadata: Map<String, Value>) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// The composite identity of this fragment
    pub fn key(&self) -> FragmentKey {
        FragmentKey::new(&self.document, &self.handle, &self.language)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_builder_and_key() {
        let fragment = Fragment::new("novel", "s1", "it")
            .with_title("Giardino")
            .with_text("Mario incontra Lucia.");

        assert_eq!(fragment.key(), FragmentKey::new("novel", "s1", "it"));
        assert_eq!(fragment.title.as_deref(), Some("Giardino"));
    }

    #[test]
    fn test_key_display() {
        let key = FragmentKey::new("novel", "s1", "it");
        assert_eq!(key.to_string(), "novel/s1@it");
    }

    #[test]
    fn test_serde_round_trip() {
        let fragment = Fragment::new("novel", "s1", "it")
            .with_text("Lucia discute con Giovanni.")
            .with_metadata([("act".to_string(), json!(2))].into_iter().collect());

        let json = serde_json::to_string(&fragment).unwrap();
        let back: Fragment = serde_json::from_str(&json).unwrap();
        assert_eq!(back, fragment);
    }

    #[test]
    fn test_empty_payload_serializes_without_nulls() {
        let fragment = Fragment::new("novel", "s1", "it");
        let json = serde_json::to_value(&fragment).unwrap();
        assert!(json.get("title").is_none());
        assert!(json.get("text").is_none());
        assert!(json.get("metadata").is_none());
    }
}
