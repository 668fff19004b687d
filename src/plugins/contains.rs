//! Case-insensitive substring match against fragment text

use crate::document::{DocumentResult, Fragment, RequirementPlugin, ResolveContext};
use serde_json::Value;

/// Claims one configurable key (e.g. `character`) and keeps fragments
/// whose `text` contains the requirement value, case-insensitively.
///
/// Non-string requirement values are matched against their JSON rendering.
pub struct TextContainsPlugin {
    id: String,
    key: String,
}

impl TextContainsPlugin {
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            id: format!("text-contains:{key}"),
            key,
        }
    }
}

impl RequirementPlugin for TextContainsPlugin {
    fn id(&self) -> &str {
        &self.id
    }

    fn can_handle(&self, key: &str, _value: &Value) -> bool {
        key == self.key
    }

    fn filter(
        &self,
        _cx: &mut ResolveContext<'_>,
        fragment: &mut Fragment,
        _key: &str,
        value: &Value,
    ) -> DocumentResult<bool> {
        let needle = match value.as_str() {
            Some(s) => s.to_lowercase(),
            None => value.to_string().to_lowercase(),
        };
        Ok(fragment
            .text
            .as_deref()
            .is_some_and(|t| t.to_lowercase().contains(&needle)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use serde_json::json;
    use std::sync::Arc;

    #[test]
    fn test_claims_only_its_key() {
        let plugin = TextContainsPlugin::new("character");
        assert!(plugin.can_handle("character", &json!("Mario")));
        assert!(!plugin.can_handle("place", &json!("giardino")));
    }

    #[test]
    fn test_match_is_case_insensitive() {
        let doc = Document::open_in_memory("novel").unwrap();
        doc.register_plugin(Arc::new(TextContainsPlugin::new("character")));
        doc.upsert_fragment(
            &Fragment::new("novel", "s1", "it").with_text("MARIO incontra Lucia."),
        )
        .unwrap();

        let hits = doc
            .search(&[("character".to_string(), json!("mario"))])
            .unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn test_fragment_without_text_never_matches() {
        let doc = Document::open_in_memory("novel").unwrap();
        let plugin = TextContainsPlugin::new("character");
        let mut cx = ResolveContext::new(&doc);

        let mut fragment = Fragment::new("novel", "s1", "it");
        let hit = plugin
            .filter(&mut cx, &mut fragment, "character", &json!("Mario"))
            .unwrap();
        assert!(!hit);
    }
}
