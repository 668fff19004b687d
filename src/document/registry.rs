//! DocumentRegistry: single-instance-per-name table of documents
//!
//! An explicit, constructed object (not a process-wide global) so tests
//! can point isolated registries at temporary storage roots.

use super::document::{Document, DocumentError, DocumentResult};
use super::fragment::{Fragment, FragmentKey};
use dashmap::DashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;

/// Maps document names to live `Document` instances.
///
/// Entries are created lazily on first `get`; storage lives at
/// `{root}/{name}/fragments.sqlite`. Distinct names can be operated on
/// concurrently; the single-instance guarantee means no two `Document`s
/// for the same name ever share a storage file.
///
/// `wipe` must not race in-flight access to the same name — excluding
/// that is the caller's responsibility.
pub struct DocumentRegistry {
    root: PathBuf,
    documents: DashMap<String, Arc<Document>>,
}

impl DocumentRegistry {
    /// Create a registry rooted at the given data directory
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            documents: DashMap::new(),
        }
    }

    /// The root data directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reject names that would escape the root as path components.
    ///
    /// Storage lives at `{root}/{name}`, so a name must be a single,
    /// non-empty, relative path segment: no separators, no `.`/`..`.
    fn validate_name(name: &str) -> DocumentResult<()> {
        if name.is_empty()
            || name == "."
            || name == ".."
            || name.contains('/')
            || name.contains('\\')
        {
            return Err(DocumentError::InvalidDocumentName(name.to_string()));
        }
        Ok(())
    }

    /// Return the existing document or construct one, opening its store
    /// on demand. Exactly one instance per name exists at a time.
    pub fn get(&self, name: &str) -> DocumentResult<Arc<Document>> {
        Self::validate_name(name)?;
        let entry = self
            .documents
            .entry(name.to_string())
            .or_try_insert_with(|| Document::open(name, &self.root).map(Arc::new))?;
        Ok(entry.value().clone())
    }

    /// Whether a document instance is currently live for `name`
    pub fn contains(&self, name: &str) -> bool {
        self.documents.contains_key(name)
    }

    /// Number of live document instances
    pub fn document_count(&self) -> usize {
        self.documents.len()
    }

    // === Fragment pass-throughs ===

    /// Fetch a fragment, resolving the document by the key's `document`
    /// field; fails with `FragmentNotFound` if absent.
    pub fn get_fragment(&self, key: &FragmentKey) -> DocumentResult<Fragment> {
        self.get(&key.document)?.get_fragment(key)
    }

    /// Insert or replace a fragment in its owning document
    pub fn upsert_fragment(&self, fragment: &Fragment) -> DocumentResult<()> {
        self.get(&fragment.document)?.upsert_fragment(fragment)
    }

    /// Remove a fragment from its owning document
    pub fn remove_fragment(&self, key: &FragmentKey) -> DocumentResult<()> {
        self.get(&key.document)?.remove_fragment(key)
    }

    /// Drop the named document and delete its persisted storage.
    ///
    /// Destructive and irreversible — equivalent to dropping a table. A
    /// subsequent `get` recreates a fresh, empty document.
    pub fn wipe(&self, name: &str) -> DocumentResult<()> {
        // An invalid name must never reach remove_dir_all: wipe("")
        // would resolve to the root and take every document with it.
        Self::validate_name(name)?;

        // Drop the live instance first so its connection is closed before
        // the storage directory goes away.
        self.documents.remove(name);

        let dir = self.root.join(name);
        match std::fs::remove_dir_all(&dir) {
            Ok(()) => {
                info!(document = %name, path = %dir.display(), "wiped document storage");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(crate::storage::StorageError::from(e).into()),
        }
    }
}
