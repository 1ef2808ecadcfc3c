//! SQLite-backed dialogue store.
//!
//! One table, `model_dialogues`, one row per transcript entry. A transcript
//! is written in a single transaction with `sequence_number` = position.

use crate::domain::model::{DialogueEntry, RunSummary, StoredMessage};
use crate::domain::ports::DialogueStore;
use crate::utils::error::{Result, SaphireError};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS model_dialogues (
        id              INTEGER PRIMARY KEY AUTOINCREMENT,
        test_name       TEXT NOT NULL,
        timestamp       DATETIME DEFAULT CURRENT_TIMESTAMP,
        model_name      TEXT NOT NULL,
        message_type    TEXT NOT NULL,
        message_content TEXT NOT NULL,
        aspect          TEXT,
        sequence_number INTEGER NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_dialogues_test_name ON model_dialogues(test_name);
    CREATE INDEX IF NOT EXISTS idx_dialogues_timestamp ON model_dialogues(timestamp);
";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Opens (creating if needed) a database file and ensures the schema.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        let journal_mode: String =
            conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get(0))?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        tracing::debug!(
            "Opened dialogue database at {} (journal_mode={})",
            path.display(),
            journal_mode
        );

        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    pub fn open_in_memory() -> Result<Self> {
        let store = Self {
            conn: Mutex::new(Connection::open_in_memory()?),
        };
        store.init()?;
        Ok(store)
    }

    /// Idempotent.
    pub fn init(&self) -> Result<()> {
        self.lock()?.execute_batch(SCHEMA)?;
        Ok(())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| SaphireError::StorageError {
            message: "database connection lock poisoned".to_string(),
        })
    }
}

impl DialogueStore for SqliteStore {
    fn save_dialogue(&self, test_name: &str, entries: &[DialogueEntry]) -> Result<()> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO model_dialogues
                    (test_name, model_name, message_type, message_content, aspect, sequence_number)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            )?;

            for (seq, entry) in entries.iter().enumerate() {
                stmt.execute(params![
                    test_name,
                    entry.speaker.as_str(),
                    entry.message_type.as_str(),
                    entry.content,
                    entry.aspect,
                    seq as i64,
                ])?;
            }
        }
        tx.commit()?;

        tracing::debug!("Saved {} entries for {}", entries.len(), test_name);
        Ok(())
    }

    fn get_dialogue(&self, test_name: &str) -> Result<Vec<StoredMessage>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT id, test_name, timestamp, model_name, message_type,
                    message_content, aspect, sequence_number
             FROM model_dialogues
             WHERE test_name = ?1
             ORDER BY sequence_number",
        )?;

        let rows = stmt.query_map(params![test_name], |row| {
            Ok(StoredMessage {
                id: row.get(0)?,
                test_name: row.get(1)?,
                timestamp: row.get::<_, Option<String>>(2)?.unwrap_or_default(),
                model_name: row.get(3)?,
                message_type: row.get(4)?,
                message_content: row.get(5)?,
                aspect: row.get(6)?,
                sequence_number: row.get(7)?,
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Most recent runs first. A run whose rows straddle a second boundary
    /// is still reported once, with its first timestamp.
    fn latest_runs(&self, limit: usize) -> Result<Vec<RunSummary>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT test_name, MIN(timestamp) AS started
             FROM model_dialogues
             GROUP BY test_name
             ORDER BY started DESC, MAX(id) DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(RunSummary {
                test_name: row.get(0)?,
                timestamp: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
            })
        })?;

        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}
