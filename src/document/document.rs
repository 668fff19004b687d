//! Document: one fragment store plus an ordered plugin chain

use super::fragment::{Fragment, FragmentKey};
use super::plugin::{RequirementPlugin, ResolveContext};
use crate::storage::{FragmentStore, OpenStore, SqliteFragmentStore, StorageError};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, RwLock};
use thiserror::Error;
use tracing::{debug, error};

/// Errors that can occur during document operations
#[derive(Debug, Error)]
pub enum DocumentError {
    /// No registered plugin claims the requirement key — a caller or
    /// configuration error, never retried.
    #[error("no plugin could handle requirement {key}={value}")]
    UnhandledRequirement { key: String, value: Value },

    /// A requirement step eliminated every candidate. Surfaced distinctly
    /// from `UnhandledRequirement` so callers can tell "nobody understood
    /// you" from "nobody matched".
    #[error("no fragments remaining after requirement {key}={value}")]
    NoFragmentsRemaining { key: String, value: Value },

    /// A plugin re-entered itself within one resolution call — a
    /// configuration bug, fatal to the current resolution.
    #[error("circular requirement detected for {key}={value}")]
    CircularRequirement { key: String, value: Value },

    /// A document name unusable as a storage path component: empty, or
    /// containing path separators or `..`.
    #[error("invalid document name: {0:?}")]
    InvalidDocumentName(String),

    #[error("fragment not found: {0}")]
    FragmentNotFound(FragmentKey),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Result type for document operations
pub type DocumentResult<T> = Result<T, DocumentError>;

/// A named document: one fragment store plus an ordered list of
/// requirement plugins (insertion order = priority order).
///
/// Resolution threads a fragment list through the first plugin willing to
/// handle each requirement, in the caller-supplied requirement order.
pub struct Document {
    name: String,
    store: Arc<dyn FragmentStore>,
    plugins: RwLock<Vec<Arc<dyn RequirementPlugin>>>,
}

impl std::fmt::Debug for Document {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Document").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Document {
    /// Create a document over an existing store
    pub fn new(name: impl Into<String>, store: Arc<dyn FragmentStore>) -> Self {
        Self {
            name: name.into(),
            store,
            plugins: RwLock::new(Vec::new()),
        }
    }

    /// Open a document backed by `{root}/{name}/fragments.sqlite`,
    /// creating the storage file on demand.
    pub fn open(name: &str, root: impl AsRef<Path>) -> DocumentResult<Self> {
        let path = root.as_ref().join(name).join("fragments.sqlite");
        let store = SqliteFragmentStore::open(path)?;
        Ok(Self::new(name, Arc::new(store)))
    }

    /// Open a document over an in-memory store (useful for testing)
    pub fn open_in_memory(name: &str) -> DocumentResult<Self> {
        let store = SqliteFragmentStore::open_in_memory()?;
        Ok(Self::new(name, Arc::new(store)))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Append a plugin to the chain. Earlier-registered plugins win
    /// first-match dispatch for the keys they claim.
    pub fn register_plugin(&self, plugin: Arc<dyn RequirementPlugin>) {
        self.plugins.write().unwrap().push(plugin);
    }

    pub fn plugin_count(&self) -> usize {
        self.plugins.read().unwrap().len()
    }

    // === Store pass-throughs ===

    /// Fetch a fragment by key; a missing row is `None`
    pub fn fragment(&self, key: &FragmentKey) -> DocumentResult<Option<Fragment>> {
        Ok(self.store.get(key)?)
    }

    /// Fetch a fragment by key, failing with `FragmentNotFound` if absent
    pub fn get_fragment(&self, key: &FragmentKey) -> DocumentResult<Fragment> {
        self.fragment(key)?
            .ok_or_else(|| DocumentError::FragmentNotFound(key.clone()))
    }

    /// Every stored fragment, in unspecified order
    pub fn all_fragments(&self) -> DocumentResult<Vec<Fragment>> {
        Ok(self.store.list_all()?)
    }

    /// Insert or replace a fragment by its primary key
    pub fn upsert_fragment(&self, fragment: &Fragment) -> DocumentResult<()> {
        self.store.upsert(fragment).map_err(|e| {
            error!(document = %self.name, key = %fragment.key(), "upsert failed: {e}");
            DocumentError::Storage(e)
        })
    }

    /// Remove a fragment; absence of the row is not an error
    pub fn remove_fragment(&self, key: &FragmentKey) -> DocumentResult<()> {
        self.store.delete(key).map_err(|e| {
            error!(document = %self.name, key = %key, "delete failed: {e}");
            DocumentError::Storage(e)
        })
    }

    // === Resolution ===

    /// Thread `fragments` through the plugins needed to satisfy each
    /// requirement, in the caller-supplied order.
    ///
    /// For each `(key, value)` pair the first registered plugin whose
    /// `can_handle` returns true is invoked; an empty list after any step
    /// fails the whole call. No partial result survives a failure.
    pub fn process_fragments(
        &self,
        fragments: &mut Vec<Fragment>,
        requirements: &[(String, Value)],
    ) -> DocumentResult<()> {
        let mut cx = ResolveContext::new(self);
        self.process_fragments_with(&mut cx, fragments, requirements)
    }

    /// Resolution entry point for re-entrant plugin calls.
    ///
    /// Plugins that need to resolve further requirements mid-filter must
    /// call this with the context they were handed, so the re-entrancy
    /// guard spans the whole chain.
    pub fn process_fragments_with(
        &self,
        cx: &mut ResolveContext<'_>,
        fragments: &mut Vec<Fragment>,
        requirements: &[(String, Value)],
    ) -> DocumentResult<()> {
        // Snapshot the chain so re-entrant resolutions never touch the lock
        // while one is in flight.
        let plugins: Vec<Arc<dyn RequirementPlugin>> =
            self.plugins.read().unwrap().clone();

        for (key, value) in requirements {
            let plugin = plugins
                .iter()
                .find(|p| p.can_handle(key, value))
                .ok_or_else(|| DocumentError::UnhandledRequirement {
                    key: key.clone(),
                    value: value.clone(),
                })?;

            debug!(
                document = %self.name,
                key = %key,
                value = %value,
                plugin = plugin.id(),
                "resolving requirement"
            );
            plugin.process(cx, fragments, key, value)?;

            if fragments.is_empty() {
                return Err(DocumentError::NoFragmentsRemaining {
                    key: key.clone(),
                    value: value.clone(),
                });
            }
        }

        Ok(())
    }

    /// Open-world search: start from no candidates and populate from the
    /// full store while applying every requirement.
    pub fn search(&self, requirements: &[(String, Value)]) -> DocumentResult<Vec<Fragment>> {
        let mut fragments = Vec::new();
        self.process_fragments(&mut fragments, requirements)?;
        Ok(fragments)
    }

    /// Re-entrant variant of [`search`](Self::search)
    pub fn search_with(
        &self,
        cx: &mut ResolveContext<'_>,
        requirements: &[(String, Value)],
    ) -> DocumentResult<Vec<Fragment>> {
        let mut fragments = Vec::new();
        self.process_fragments_with(cx, &mut fragments, requirements)?;
        Ok(fragments)
    }

    /// Closed-world enrichment: apply every requirement to a single
    /// fragment, returning the (possibly mutated) fragment. Fails with
    /// `NoFragmentsRemaining` if the fragment is filtered out.
    pub fn enrich(
        &self,
        fragment: Fragment,
        requirements: &[(String, Value)],
    ) -> DocumentResult<Fragment> {
        let mut fragments = vec![fragment];
        self.process_fragments(&mut fragments, requirements)?;
        Ok(fragments.remove(0))
    }
}
