//! Storage trait definitions

use crate::document::{Fragment, FragmentKey};
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for fragment storage backends
///
/// One store holds the fragments of exactly one document. Implementations
/// must be thread-safe (Send + Sync): mutations on the same key resolve
/// last-write-wins, and readers never observe a half-written row.
pub trait FragmentStore: Send + Sync {
    /// Fetch a fragment by its composite key.
    ///
    /// A missing row is a normal outcome, not an error — callers routinely
    /// probe for existence.
    fn get(&self, key: &FragmentKey) -> StorageResult<Option<Fragment>>;

    /// Return every stored fragment, in unspecified order.
    ///
    /// Rows with unreadable metadata are skipped (and logged), never
    /// aborting the whole listing.
    fn list_all(&self) -> StorageResult<Vec<Fragment>>;

    /// Insert or replace a fragment by its primary key.
    ///
    /// Replaces title, text and metadata atomically; durably committed
    /// before returning.
    fn upsert(&self, fragment: &Fragment) -> StorageResult<()>;

    /// Remove a fragment if present. Absence of the row is not an error.
    fn delete(&self, key: &FragmentKey) -> StorageResult<()>;
}

/// Extension trait for opening stores from paths
pub trait OpenStore: FragmentStore + Sized {
    /// Open or create a store at the given path
    fn open(path: impl AsRef<Path>) -> StorageResult<Self>;

    /// Create an in-memory store (useful for testing)
    fn open_in_memory() -> StorageResult<Self>;
}
