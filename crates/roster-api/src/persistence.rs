use std::fmt;
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use contracts::stat_doc::StatData;
use contracts::InjectionPrompt;
use rusqlite::{params, Connection, OptionalExtension};
use roster_core::{HostBridge, HostError};
use serde_json::Value;

#[derive(Debug)]
pub enum PersistenceError {
    Sqlite(rusqlite::Error),
    Serde(serde_json::Error),
}

impl fmt::Display for PersistenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite(err) => write!(f, "sqlite error: {err}"),
            Self::Serde(err) => write!(f, "serde error: {err}"),
        }
    }
}

impl std::error::Error for PersistenceError {}

impl From<rusqlite::Error> for PersistenceError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Sqlite(value)
    }
}

impl From<serde_json::Error> for PersistenceError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serde(value)
    }
}

/// SQLite-backed host: one row each for the roster blob and the mirrored
/// document, plus a durable queue of injection prompts the host drains at
/// generation time.
#[derive(Debug)]
pub struct SqliteHost {
    conn: Connection,
}

impl SqliteHost {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistenceError> {
        let conn = Connection::open(path)?;
        Self::attach(conn)
    }

    pub fn open_in_memory() -> Result<Self, PersistenceError> {
        let conn = Connection::open_in_memory()?;
        Self::attach(conn)
    }

    fn attach(conn: Connection) -> Result<Self, PersistenceError> {
        let mut host = Self { conn };
        host.configure()?;
        host.migrate()?;
        host.seed_stat_doc()?;
        Ok(host)
    }

    fn configure(&mut self) -> Result<(), PersistenceError> {
        self.conn.pragma_update(None, "journal_mode", "WAL")?;
        self.conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(())
    }

    fn migrate(&mut self) -> Result<(), PersistenceError> {
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS schema_migrations (
                version INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                applied_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS roster_blob (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                payload_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS stat_doc (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                payload_json TEXT NOT NULL,
                updated_at INTEGER NOT NULL
            );

            CREATE TABLE IF NOT EXISTS prompt_queue (
                prompt_id TEXT PRIMARY KEY,
                role TEXT NOT NULL,
                content TEXT NOT NULL,
                should_scan INTEGER NOT NULL,
                created_at INTEGER NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_prompt_queue_created ON prompt_queue(created_at);
            ",
        )?;

        self.conn.execute(
            "INSERT OR IGNORE INTO schema_migrations(version, name, applied_at)
             VALUES(1, 'initial_v1', ?1)",
            params![wall_clock_ms()],
        )?;

        Ok(())
    }

    /// A fresh database starts from a repaired default document so the first
    /// engine read never sees an absent mirror.
    fn seed_stat_doc(&mut self) -> Result<(), PersistenceError> {
        let default_doc = serde_json::to_string(&StatData::default().repair())?;
        self.conn.execute(
            "INSERT OR IGNORE INTO stat_doc(id, payload_json, updated_at)
             VALUES(1, ?1, ?2)",
            params![default_doc, wall_clock_ms()],
        )?;
        Ok(())
    }

    /// Removes and returns every queued injection prompt in insertion order.
    pub fn drain_pending_prompts(&mut self) -> Result<Vec<InjectionPrompt>, PersistenceError> {
        let tx = self.conn.transaction()?;
        let mut prompts = Vec::new();
        {
            let mut stmt = tx.prepare(
                "SELECT prompt_id, role, content, should_scan
                 FROM prompt_queue
                 ORDER BY created_at ASC, prompt_id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(InjectionPrompt {
                    id: row.get(0)?,
                    role: row.get(1)?,
                    content: row.get(2)?,
                    should_scan: row.get::<_, i64>(3)? != 0,
                })
            })?;
            for row in rows {
                prompts.push(row?);
            }
        }
        tx.execute("DELETE FROM prompt_queue", [])?;
        tx.commit()?;
        Ok(prompts)
    }
}

impl HostBridge for SqliteHost {
    fn load_roster(&mut self) -> Result<Option<Value>, HostError> {
        let payload: Option<String> = self
            .conn
            .query_row(
                "SELECT payload_json FROM roster_blob WHERE id = 1",
                [],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| HostError::Store(err.to_string()))?;

        match payload {
            Some(raw) => serde_json::from_str(&raw)
                .map(Some)
                .map_err(|err| HostError::Store(err.to_string())),
            None => Ok(None),
        }
    }

    fn save_roster(&mut self, blob: &Value) -> Result<(), HostError> {
        let payload = serde_json::to_string(blob).map_err(|err| HostError::Store(err.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO roster_blob(id, payload_json, updated_at)
                 VALUES(1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     payload_json = excluded.payload_json,
                     updated_at = excluded.updated_at",
                params![payload, wall_clock_ms()],
            )
            .map_err(|err| HostError::Store(err.to_string()))?;
        Ok(())
    }

    fn read_stat(&mut self) -> Result<Value, HostError> {
        let payload: String = self
            .conn
            .query_row("SELECT payload_json FROM stat_doc WHERE id = 1", [], |row| {
                row.get(0)
            })
            .map_err(|err| HostError::Document(err.to_string()))?;
        serde_json::from_str(&payload).map_err(|err| HostError::Document(err.to_string()))
    }

    fn replace_stat(&mut self, doc: &StatData) -> Result<(), HostError> {
        let payload =
            serde_json::to_string(doc).map_err(|err| HostError::Document(err.to_string()))?;
        self.conn
            .execute(
                "INSERT INTO stat_doc(id, payload_json, updated_at)
                 VALUES(1, ?1, ?2)
                 ON CONFLICT(id) DO UPDATE SET
                     payload_json = excluded.payload_json,
                     updated_at = excluded.updated_at",
                params![payload, wall_clock_ms()],
            )
            .map_err(|err| HostError::Document(err.to_string()))?;
        Ok(())
    }

    fn inject_prompts(&mut self, prompts: &[InjectionPrompt]) {
        for prompt in prompts {
            let inserted = self.conn.execute(
                "INSERT OR IGNORE INTO prompt_queue(prompt_id, role, content, should_scan, created_at)
                 VALUES(?1, ?2, ?3, ?4, ?5)",
                params![
                    prompt.id.as_str(),
                    prompt.role.as_str(),
                    prompt.content.as_str(),
                    if prompt.should_scan { 1_i64 } else { 0_i64 },
                    wall_clock_ms(),
                ],
            );
            if let Err(err) = inserted {
                tracing::warn!(prompt_id = %prompt.id, error = %err, "dropping injection prompt");
            }
        }
    }

    fn now_ms(&mut self) -> i64 {
        wall_clock_ms()
    }
}

fn wall_clock_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_millis() as i64)
        .unwrap_or(0)
}
