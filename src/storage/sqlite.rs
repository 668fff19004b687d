//! SQLite storage backend for fragments

use super::traits::{FragmentStore, OpenStore, StorageError, StorageResult};
use crate::document::{Fragment, FragmentKey};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Mutex;
use tracing::warn;

/// SQLite-backed fragment store
///
/// Uses a single database file with one `fragments` table, primary key
/// `(document, handle, language)`. Thread-safe via internal mutex on the
/// connection; WAL mode keeps concurrent readers off half-written rows.
///
/// The `metadata` column holds serialized JSON, so structured metadata
/// round-trips through a safe decoder.
pub struct SqliteFragmentStore {
    conn: Mutex<Connection>,
}

impl SqliteFragmentStore {
    /// Initialize the database schema
    fn init_schema(conn: &Connection) -> StorageResult<()> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS fragments (
                document TEXT NOT NULL,
                handle TEXT NOT NULL,
                language TEXT NOT NULL,
                title TEXT,
                text TEXT,
                metadata TEXT,
                PRIMARY KEY (document, handle, language)
            );

            -- Enable WAL mode for concurrent reads during writes
            PRAGMA journal_mode = WAL;
            "#,
        )?;
        Ok(())
    }

    /// Serialize metadata to its column representation
    fn metadata_to_column(metadata: Option<&Map<String, Value>>) -> StorageResult<Option<String>> {
        metadata
            .map(|m| serde_json::to_string(m).map_err(StorageError::from))
            .transpose()
    }

    /// Deserialize the metadata column
    fn column_to_metadata(column: Option<String>) -> StorageResult<Option<Map<String, Value>>> {
        column
            .map(|json| serde_json::from_str(&json).map_err(StorageError::from))
            .transpose()
    }
}

impl OpenStore for SqliteFragmentStore {
    fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }
}

impl FragmentStore for SqliteFragmentStore {
    fn get(&self, key: &FragmentKey) -> StorageResult<Option<Fragment>> {
        let conn = self.conn.lock().unwrap();

        let row: Option<(Option<String>, Option<String>, Option<String>)> = conn
            .query_row(
                "SELECT title, text, metadata FROM fragments
                 WHERE document = ?1 AND handle = ?2 AND language = ?3",
                params![key.document, key.handle, key.language],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        match row {
            Some((title, text, metadata)) => Ok(Some(Fragment {
                document: key.document.clone(),
                handle: key.handle.clone(),
                language: key.language.clone(),
                title,
                text,
                metadata: Self::column_to_metadata(metadata)?,
            })),
            None => Ok(None),
        }
    }

    fn list_all(&self) -> StorageResult<Vec<Fragment>> {
        let conn = self.conn.lock().unwrap();

        let mut stmt = conn.prepare(
            "SELECT document, handle, language, title, text, metadata FROM fragments",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, Option<String>>(3)?,
                row.get::<_, Option<String>>(4)?,
                row.get::<_, Option<String>>(5)?,
            ))
        })?;

        let mut fragments = Vec::new();
        for row in rows {
            let (document, handle, language, title, text, metadata) = row?;
            let metadata = match Self::column_to_metadata(metadata) {
                Ok(m) => m,
                Err(e) => {
                    warn!(
                        document = %document,
                        handle = %handle,
                        language = %language,
                        "skipping fragment with unreadable metadata: {e}"
                    );
                    continue;
                }
            };
            fragments.push(Fragment {
                document,
                handle,
                language,
                title,
                text,
                metadata,
            });
        }

        Ok(fragments)
    }

    fn upsert(&self, fragment: &Fragment) -> StorageResult<()> {
        let metadata = Self::metadata_to_column(fragment.metadata.as_ref())?;
        let conn = self.conn.lock().unwrap();

        conn.execute(
            r#"
            INSERT INTO fragments (document, handle, language, title, text, metadata)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(document, handle, language) DO UPDATE SET
                title = excluded.title,
                text = excluded.text,
                metadata = excluded.metadata
            "#,
            params![
                fragment.document,
                fragment.handle,
                fragment.language,
                fragment.title,
                fragment.text,
                metadata,
            ],
        )?;

        Ok(())
    }

    fn delete(&self, key: &FragmentKey) -> StorageResult<()> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM fragments WHERE document = ?1 AND handle = ?2 AND language = ?3",
            params![key.document, key.handle, key.language],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn create_test_store() -> SqliteFragmentStore {
        SqliteFragmentStore::open_in_memory().unwrap()
    }

    fn scene(handle: &str, text: &str) -> Fragment {
        Fragment::new("novel", handle, "it").with_text(text)
    }

    #[test]
    fn test_get_missing_row_is_none() {
        let store = create_test_store();
        let key = FragmentKey::new("novel", "absent", "it");
        assert!(store.get(&key).unwrap().is_none());
    }

    #[test]
    fn test_upsert_and_get() {
        let store = create_test_store();
        let fragment = scene("s1", "Mario incontra Lucia nel giardino.")
            .with_title("Giardino");
        store.upsert(&fragment).unwrap();

        let loaded = store.get(&fragment.key()).unwrap().unwrap();
        assert_eq!(loaded.title.as_deref(), Some("Giardino"));
        assert_eq!(
            loaded.text.as_deref(),
            Some("Mario incontra Lucia nel giardino.")
        );
        assert!(loaded.metadata.is_none());
    }

    #[test]
    fn test_upsert_replaces_by_primary_key() {
        let store = create_test_store();
        store.upsert(&scene("s1", "first draft")).unwrap();
        store
            .upsert(&scene("s1", "second draft").with_title("v2"))
            .unwrap();

        // Exactly one row, holding the most recent upsert.
        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text.as_deref(), Some("second draft"));
        assert_eq!(all[0].title.as_deref(), Some("v2"));
    }

    #[test]
    fn test_same_handle_different_language_is_distinct() {
        let store = create_test_store();
        store.upsert(&scene("s1", "italiano")).unwrap();
        let mut english = scene("s1", "english");
        english.language = "en".to_string();
        store.upsert(&english).unwrap();

        assert_eq!(store.list_all().unwrap().len(), 2);
    }

    #[test]
    fn test_metadata_round_trip() {
        let store = create_test_store();
        let fragment = scene("s1", "Mario e Lucia si riconciliano.").with_metadata(
            [
                ("act".to_string(), json!(3)),
                ("cast".to_string(), json!(["Mario", "Lucia"])),
                ("draft".to_string(), json!({"reviewed": true})),
            ]
            .into_iter()
            .collect(),
        );
        store.upsert(&fragment).unwrap();

        let loaded = store.get(&fragment.key()).unwrap().unwrap();
        assert_eq!(loaded.metadata, fragment.metadata);
    }

    #[test]
    fn test_delete_absent_row_is_ok() {
        let store = create_test_store();
        let key = FragmentKey::new("novel", "absent", "it");
        store.delete(&key).unwrap();
    }

    #[test]
    fn test_delete_removes_row() {
        let store = create_test_store();
        let fragment = scene("s1", "Lucia discute con Giovanni.");
        store.upsert(&fragment).unwrap();

        store.delete(&fragment.key()).unwrap();
        assert!(store.get(&fragment.key()).unwrap().is_none());
    }

    #[test]
    fn test_list_all_skips_corrupt_metadata_rows() {
        let store = create_test_store();
        store.upsert(&scene("good", "readable")).unwrap();

        // Simulate a row written by a broken producer: metadata that is
        // not valid JSON.
        {
            let conn = store.conn.lock().unwrap();
            conn.execute(
                "INSERT INTO fragments (document, handle, language, metadata)
                 VALUES ('novel', 'bad', 'it', '{not json')",
                [],
            )
            .unwrap();
        }

        let all = store.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].handle, "good");
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("novel").join("fragments.sqlite");
        let store = SqliteFragmentStore::open(&path).unwrap();

        store.upsert(&scene("s1", "persisted")).unwrap();
        drop(store);
        assert!(path.exists());

        // Reopen and read back.
        let reopened = SqliteFragmentStore::open(&path).unwrap();
        let all = reopened.list_all().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].text.as_deref(), Some("persisted"));
    }

    #[test]
    fn test_wal_mode_enabled_at_connection() {
        let dir = tempfile::tempdir().unwrap();
        let store = SqliteFragmentStore::open(dir.path().join("wal.sqlite")).unwrap();

        let journal_mode: String = store
            .conn
            .lock()
            .unwrap()
            .query_row("PRAGMA journal_mode", [], |row| row.get(0))
            .unwrap();

        assert_eq!(journal_mode, "wal");
    }
}
