//! RequirementPlugin — the contract requirement handlers implement
//!
//! A plugin claims zero or more requirement keys and filters or enriches a
//! candidate fragment list. The engine is agnostic to what a key means; it
//! only runs the dispatch protocol.

use super::document::{Document, DocumentError, DocumentResult};
use super::fragment::Fragment;
use serde_json::Value;
use std::collections::HashSet;

/// Per-call resolution state, threaded through every plugin invocation.
///
/// Carries the set of plugin ids currently executing so re-entrant
/// resolutions (a plugin resolving further requirements mid-filter) are
/// caught as `CircularRequirement` instead of recursing. The guard lives
/// in the call, not the plugin instance, so concurrent resolutions on a
/// shared document never interfere.
pub struct ResolveContext<'a> {
    document: &'a Document,
    in_flight: HashSet<String>,
}

impl<'a> ResolveContext<'a> {
    pub(crate) fn new(document: &'a Document) -> Self {
        Self {
            document,
            in_flight: HashSet::new(),
        }
    }

    /// The document this resolution runs against
    pub fn document(&self) -> &'a Document {
        self.document
    }

    fn enter(&mut self, plugin_id: &str) -> bool {
        self.in_flight.insert(plugin_id.to_string())
    }

    fn exit(&mut self, plugin_id: &str) {
        self.in_flight.remove(plugin_id);
    }
}

/// The contract requirement handlers implement.
///
/// `can_handle` and `filter` are the variant-specific parts; `process` is
/// the shared orchestration combinator and rarely needs overriding.
pub trait RequirementPlugin: Send + Sync {
    /// Unique identifier for this plugin (used by the re-entrancy guard)
    fn id(&self) -> &str;

    /// Whether this plugin is the authority for `(key, value)`.
    ///
    /// Pure predicate; safe to call speculatively and repeatedly.
    fn can_handle(&self, key: &str, value: &Value) -> bool;

    /// Whether one fragment satisfies the requirement.
    ///
    /// Implementations may also enrich the fragment (populate `text` or
    /// `metadata`) as a side effect of being selected; enrichment must be
    /// idempotent.
    fn filter(
        &self,
        cx: &mut ResolveContext<'_>,
        fragment: &mut Fragment,
        key: &str,
        value: &Value,
    ) -> DocumentResult<bool>;

    /// Apply the requirement to a candidate list.
    ///
    /// An empty input list is open-world: populate from every stored
    /// fragment, keeping those that pass `filter`. A non-empty list is
    /// closed-world: narrow it in place. The re-entrancy guard is released
    /// on every exit path, including `filter` errors.
    fn process(
        &self,
        cx: &mut ResolveContext<'_>,
        fragments: &mut Vec<Fragment>,
        key: &str,
        value: &Value,
    ) -> DocumentResult<()> {
        if !cx.enter(self.id()) {
            return Err(DocumentError::CircularRequirement {
                key: key.to_string(),
                value: value.clone(),
            });
        }

        let outcome = (|| -> DocumentResult<()> {
            let candidates = if fragments.is_empty() {
                cx.document().all_fragments()?
            } else {
                std::mem::take(fragments)
            };
            for mut fragment in candidates {
                if self.filter(cx, &mut fragment, key, value)? {
                    fragments.push(fragment);
                }
            }
            Ok(())
        })();

        cx.exit(self.id());
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::Arc;

    struct FailingMatcher;

    impl RequirementPlugin for FailingMatcher {
        fn id(&self) -> &str {
            "failing"
        }

        fn can_handle(&self, key: &str, _value: &Value) -> bool {
            key == "fail"
        }

        fn filter(
            &self,
            _cx: &mut ResolveContext<'_>,
            _fragment: &mut Fragment,
            key: &str,
            value: &Value,
        ) -> DocumentResult<bool> {
            Err(DocumentError::UnhandledRequirement {
                key: key.to_string(),
                value: value.clone(),
            })
        }
    }

    struct AcceptAll;

    impl RequirementPlugin for AcceptAll {
        fn id(&self) -> &str {
            "accept-all"
        }

        fn can_handle(&self, key: &str, _value: &Value) -> bool {
            key == "any"
        }

        fn filter(
            &self,
            _cx: &mut ResolveContext<'_>,
            _fragment: &mut Fragment,
            _key: &str,
            _value: &Value,
        ) -> DocumentResult<bool> {
            Ok(true)
        }
    }

    fn seeded_document() -> Document {
        let doc = Document::open_in_memory("novel").unwrap();
        doc.upsert_fragment(&Fragment::new("novel", "s1", "it").with_text("uno"))
            .unwrap();
        doc.upsert_fragment(&Fragment::new("novel", "s2", "it").with_text("due"))
            .unwrap();
        doc
    }

    #[test]
    fn test_open_world_populates_from_store() {
        let doc = seeded_document();
        let plugin = AcceptAll;
        let mut cx = ResolveContext::new(&doc);

        let mut fragments = Vec::new();
        plugin
            .process(&mut cx, &mut fragments, "any", &json!(true))
            .unwrap();
        assert_eq!(fragments.len(), 2);
    }

    #[test]
    fn test_closed_world_narrows_in_place() {
        let doc = seeded_document();
        let plugin = AcceptAll;
        let mut cx = ResolveContext::new(&doc);

        // Closed-world input is taken as-is, not repopulated from the store.
        let mut fragments = vec![Fragment::new("novel", "only", "it")];
        plugin
            .process(&mut cx, &mut fragments, "any", &json!(true))
            .unwrap();
        assert_eq!(fragments.len(), 1);
        assert_eq!(fragments[0].handle, "only");
    }

    #[test]
    fn test_guard_released_after_filter_error() {
        let doc = seeded_document();
        doc.register_plugin(Arc::new(FailingMatcher));

        let requirements = vec![("fail".to_string(), json!("x"))];
        assert!(doc.search(&requirements).is_err());

        // A failed resolution must not leave the guard set: a fresh call
        // fails with the filter's own error again, not CircularRequirement.
        let err = doc.search(&requirements).unwrap_err();
        assert!(matches!(err, DocumentError::UnhandledRequirement { .. }));
    }

    #[test]
    fn test_guard_released_within_one_call() {
        let doc = seeded_document();
        let plugin = AcceptAll;
        let mut cx = ResolveContext::new(&doc);

        let mut fragments = Vec::new();
        plugin
            .process(&mut cx, &mut fragments, "any", &json!(true))
            .unwrap();
        // Same context, same plugin, sequential invocation: no false cycle.
        plugin
            .process(&mut cx, &mut fragments, "any", &json!(true))
            .unwrap();
        assert_eq!(fragments.len(), 2);
    }
}
