//! Semadb: fragment store with plugin-based requirement resolution
//!
//! A document owns a set of text fragments, each keyed by the composite
//! identity `(document, handle, language)`, plus an ordered list of
//! requirement plugins. Callers search or enrich fragments by supplying
//! keyword-style requirements (e.g. `character="Mario"`); each requirement
//! is resolved by the first registered plugin that claims its key.
//!
//! # Core Concepts
//!
//! - **Fragments**: atomic stored text units with a composite primary key
//! - **Plugins**: capability objects that filter or enrich candidate lists
//! - **Documents**: one fragment store plus one plugin chain
//! - **Registry**: lazy, single-instance-per-name table of documents
//!
//! # Example
//!
//! ```
//! use semadb::{Document, Fragment};
//! use semadb::plugins::TextContainsPlugin;
//! use std::sync::Arc;
//!
//! let doc = Document::open_in_memory("novel").unwrap();
//! doc.register_plugin(Arc::new(TextContainsPlugin::new("character")));
//! doc.upsert_fragment(
//!     &Fragment::new("novel", "s1", "it").with_text("Mario incontra Lucia."),
//! )
//! .unwrap();
//!
//! let hits = doc
//!     .search(&[("character".to_string(), "Mario".into())])
//!     .unwrap();
//! assert_eq!(hits.len(), 1);
//! ```

pub mod document;
pub mod plugins;
pub mod storage;

pub use document::{
    Document, DocumentError, DocumentRegistry, DocumentResult, Fragment, FragmentKey,
    RequirementPlugin, ResolveContext,
};
pub use storage::{FragmentStore, OpenStore, SqliteFragmentStore, StorageError, StorageResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
