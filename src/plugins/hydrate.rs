//! Store-backed enrichment: fill fragment payloads from their stored rows

use crate::document::{DocumentResult, Fragment, RequirementPlugin, ResolveContext};
use serde_json::Value;

/// Claims the `hydrate` key. Keeps fragments that exist in the store and
/// fills their missing `title`/`text`/`metadata` from the stored row —
/// already-populated fields are left untouched, so applying the
/// requirement twice changes nothing.
///
/// Open-world this narrows to nothing useful (stored fragments are already
/// full); it exists for closed-world chains where callers hold bare
/// identities and want bodies attached.
pub struct StoreHydratePlugin;

impl StoreHydratePlugin {
    pub fn new() -> Self {
        Self
    }
}

impl Default for StoreHydratePlugin {
    fn default() -> Self {
        Self::new()
    }
}

impl RequirementPlugin for StoreHydratePlugin {
    fn id(&self) -> &str {
        "store-hydrate"
    }

    fn can_handle(&self, key: &str, _value: &Value) -> bool {
        key == "hydrate"
    }

    fn filter(
        &self,
        cx: &mut ResolveContext<'_>,
        fragment: &mut Fragment,
        _key: &str,
        _value: &Value,
    ) -> DocumentResult<bool> {
        let Some(stored) = cx.document().fragment(&fragment.key())? else {
            return Ok(false);
        };

        if fragment.title.is_none() {
            fragment.title = stored.title;
        }
        if fragment.text.is_none() {
            fragment.text = stored.text;
        }
        if fragment.metadata.is_none() {
            fragment.metadata = stored.metadata;
        }
        Ok(true)
    }
}
