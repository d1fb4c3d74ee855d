use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;
use std::sync::Mutex;

use super::{SessionStore, DOC_ID_KEY, FILE_NAME_KEY};
use crate::error::ChatError;

/// `SessionStore` backed by a key/value table in a SQLite file.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(app_dir: &Path) -> Result<Self, ChatError> {
        std::fs::create_dir_all(app_dir)?;
        let conn = Connection::open(app_dir.join("pdf-chat.db"))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, ChatError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, ChatError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.migrate()?;
        Ok(store)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, ChatError> {
        self.conn
            .lock()
            .map_err(|_| ChatError::Storage("connection lock poisoned".into()))
    }

    fn migrate(&self) -> Result<(), ChatError> {
        let conn = self.lock()?;
        conn.execute_batch(
            "
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS session (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    fn get(conn: &Connection, key: &str) -> Result<Option<String>, ChatError> {
        let value = conn
            .query_row(
                "SELECT value FROM session WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }
}

impl SessionStore for SqliteStore {
    fn load(&self) -> Result<Option<(String, String)>, ChatError> {
        let conn = self.lock()?;
        let doc_id = Self::get(&conn, DOC_ID_KEY)?;
        let name = Self::get(&conn, FILE_NAME_KEY)?;
        Ok(doc_id.zip(name))
    }

    fn save(&self, doc_id: &str, display_name: &str) -> Result<(), ChatError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        for (key, value) in [(DOC_ID_KEY, doc_id), (FILE_NAME_KEY, display_name)] {
            tx.execute(
                "INSERT OR REPLACE INTO session (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
                params![key, value],
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    fn clear(&self) -> Result<(), ChatError> {
        let conn = self.lock()?;
        conn.execute(
            "DELETE FROM session WHERE key IN (?1, ?2)",
            params![DOC_ID_KEY, FILE_NAME_KEY],
        )?;
        Ok(())
    }
}
