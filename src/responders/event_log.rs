//! SQLite audit log of every decision.

use anyhow::{Context, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use rusqlite::{params, Connection};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

use super::Responder;
use crate::decision::classify::Action;
use crate::decision::record::DecisionRecord;

const MAX_REASON_CHARS: usize = 1000;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS events (
    id TEXT PRIMARY KEY,
    ts TEXT NOT NULL,
    type TEXT NOT NULL,
    combined_score INTEGER NOT NULL CHECK(combined_score >= 0 AND combined_score <= 100),
    action TEXT NOT NULL CHECK(action IN ('alert','log','ignore')),
    reason TEXT NOT NULL,
    payload TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_events_ts ON events(ts);
CREATE INDEX IF NOT EXISTS idx_events_action ON events(action);
"#;

/// A row of the `events` table.
#[derive(Debug, Clone, Serialize)]
pub struct LoggedEvent {
    pub id: String,
    pub ts: String,
    pub input_type: String,
    pub combined_score: u8,
    pub action: String,
    pub reason: String,
    pub payload: String,
}

pub struct EventLogResponder {
    conn: Arc<Mutex<Connection>>,
}

impl EventLogResponder {
    /// Open (or create) the event log at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open event log at {}", path.display()))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        let log = Self::with_connection(conn)?;
        tracing::info!(path = %path.display(), "event log ready");
        Ok(log)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory().context("failed to open in-memory event log")?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA_SQL).context("failed to initialize events schema")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Insert one decision synchronously.
    pub fn insert(&self, record: &DecisionRecord) -> Result<String> {
        let id = uuid::Uuid::now_v7().to_string();
        let reason: String = record.reason().chars().take(MAX_REASON_CHARS).collect();
        let payload = serde_json::to_string(&record.to_payload())?;
        self.conn.lock().execute(
            "INSERT INTO events (id, ts, type, combined_score, action, reason, payload) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                id,
                record.timestamp().to_rfc3339(),
                record.input_kind().as_str(),
                record.combined_score(),
                record.action().as_str(),
                reason,
                payload,
            ],
        )?;
        Ok(id)
    }

    /// Most recent `limit` rows, newest first.
    pub fn recent(&self, limit: usize) -> Result<Vec<LoggedEvent>> {
        let conn = self.conn.lock();
        let mut stmt = conn.prepare(
            "SELECT id, ts, type, combined_score, action, reason, payload \
             FROM events ORDER BY ts DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok(LoggedEvent {
                    id: row.get(0)?,
                    ts: row.get(1)?,
                    input_type: row.get(2)?,
                    combined_score: row.get(3)?,
                    action: row.get(4)?,
                    reason: row.get(5)?,
                    payload: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[async_trait]
impl Responder for EventLogResponder {
    fn name(&self) -> &str {
        "event_log"
    }

    fn wants(&self, _action: Action) -> bool {
        true
    }

    async fn respond(&self, record: &DecisionRecord) -> Result<()> {
        let log = Self {
            conn: Arc::clone(&self.conn),
        };
        let record = record.clone();
        tokio::task::spawn_blocking(move || log.insert(&record))
            .await
            .context("event log task failed")??;
        Ok(())
    }
}
