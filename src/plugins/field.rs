//! Exact equality on identity and title fields

use crate::document::{DocumentResult, Fragment, RequirementPlugin, ResolveContext};
use serde_json::Value;

/// Claims the `handle`, `language` and `title` keys and keeps fragments
/// whose corresponding field equals the requirement value exactly.
pub struct FieldEqualsPlugin;

impl FieldEqualsPlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FieldEqualsPlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementPlugin for FieldEqualsPlugin {
    fn id(&self) -> &str {
        "field-equals"
    }

    fn can_handle(&self, key: &str, _value: &Value) -> bool {
        matches!(key, "handle" | "language" | "title")
    }

    fn filter(
        &self,
        _cx: &mut ResolveContext<'_>,
        fragment: &mut Fragment,
        key: &str,
        value: &Value,
    ) -> DocumentResult<bool> {
        let Some(wanted) = value.as_str() else {
            return Ok(false);
        };
        Ok(match key {
            "handle" => fragment.handle == wanted,
            "language" => fragment.language == wanted,
            "title" => fragment.title.as_deref() == Some(wanted),
            _ => false,
        })
    }
}
