use rusqlite::{params, Connection, OptionalExtension};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use crate::app_dirs::AppDirs;
use crate::error::StoreError;
use crate::scoring::ResultRecord;

/// The single well-known slot holding the latest result
pub const RESULTS_KEY: &str = "examify-results";

/// Persistence collaborator for finished sessions
pub trait ResultStore {
    fn save(&self, result: &ResultRecord) -> Result<(), StoreError>;
    fn load(&self) -> Result<Option<ResultRecord>, StoreError>;
}

/// Key/value table in SQLite; only [`RESULTS_KEY`] is ever written
#[derive(Debug)]
pub struct SqliteResultStore {
    conn: Connection,
}

impl SqliteResultStore {
    /// Open the store at the default state-dir location
    pub fn new() -> Result<Self, StoreError> {
        let db_path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("examify.db"));
        Self::open(db_path)
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            r#"
            CREATE TABLE IF NOT EXISTS kv_store (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at DATETIME DEFAULT CURRENT_TIMESTAMP
            )
            "#,
            [],
        )?;

        Ok(Self { conn })
    }
}

impl ResultStore for SqliteResultStore {
    fn save(&self, result: &ResultRecord) -> Result<(), StoreError> {
        let blob = serde_json::to_string(result)?;
        self.conn.execute(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?1, ?2, CURRENT_TIMESTAMP)
            ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
            params![RESULTS_KEY, blob],
        )?;
        log::debug!("saved {} result under {}", result.exam_type, RESULTS_KEY);
        Ok(())
    }

    fn load(&self) -> Result<Option<ResultRecord>, StoreError> {
        let blob: Option<String> = self
            .conn
            .query_row(
                "SELECT value FROM kv_store WHERE key = ?1",
                [RESULTS_KEY],
                |row| row.get(0),
            )
            .optional()?;

        match blob {
            Some(blob) => Ok(Some(serde_json::from_str(&blob)?)),
            None => Ok(None),
        }
    }
}

/// In-process store holding the serialized blob, for tests and headless hosts
#[derive(Debug, Default)]
pub struct MemoryResultStore {
    blob: RefCell<Option<String>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> Option<String> {
        self.blob.borrow().clone()
    }
}

impl ResultStore for MemoryResultStore {
    fn save(&self, result: &ResultRecord) -> Result<(), StoreError> {
        *self.blob.borrow_mut() = Some(serde_json::to_string(result)?);
        Ok(())
    }

    fn load(&self) -> Result<Option<ResultRecord>, StoreError> {
        match self.blob.borrow().as_deref() {
            Some(blob) => Ok(Some(serde_json::from_str(blob)?)),
            None => Ok(None),
        }
    }
}
