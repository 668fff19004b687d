//! Durable fragment storage

mod sqlite;
mod traits;

pub use sqlite::SqliteFragmentStore;
pub use traits::{FragmentStore, OpenStore, StorageError, StorageResult};
