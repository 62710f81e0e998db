//! File-backed memory snapshots.
//!
//! [`PersistenceManager`] is the only component that touches the snapshot
//! file. Writes go to `<path>.tmp`, are fsynced, and are then renamed over the
//! canonical path, so a reader sees either the previous snapshot or the new
//! one, never a partial file. [`PersistenceManager::load`] treats anything it
//! cannot trust as absent so the process can always start.

pub mod flusher;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::PersistError;
use crate::memory::types::{LongTermStats, MemoryEvent};

/// Version written into every snapshot.
pub const SCHEMA_VERSION: u32 = 1;

/// Serialized memory state. `short_term` is oldest-first (most recent last).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedSnapshot {
    pub schema_version: u32,
    pub short_term: Vec<MemoryEvent>,
    pub long_term: LongTermStats,
}

impl PersistedSnapshot {
    pub fn empty() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            short_term: Vec::new(),
            long_term: LongTermStats::default(),
        }
    }
}

/// Owner of the snapshot file.
#[derive(Debug, Clone)]
pub struct PersistenceManager {
    path: PathBuf,
    // Serializes writers so renames land in the order writes started.
    write_lock: Arc<Mutex<()>>,
}

impl PersistenceManager {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Load the snapshot, or `None` if it is missing, unreadable, corrupt, or
    /// from an unknown schema version. Problems are logged, never raised.
    pub fn load(&self) -> Option<PersistedSnapshot> {
        match self.try_load() {
            Ok(Some(snapshot)) => {
                tracing::info!(
                    path = %self.path.display(),
                    events = snapshot.short_term.len(),
                    total = snapshot.long_term.total_events,
                    "memory snapshot loaded"
                );
                Some(snapshot)
            }
            Ok(None) => {
                tracing::info!(path = %self.path.display(), "no memory snapshot, starting empty");
                None
            }
            Err(e) => {
                tracing::warn!(error = &e as &dyn std::error::Error, "memory snapshot unusable, starting empty");
                None
            }
        }
    }

    /// Strict load: distinguishes a missing file from an unusable one.
    pub fn try_load(&self) -> Result<Option<PersistedSnapshot>, PersistError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(PersistError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let value: serde_json::Value =
            serde_json::from_str(&contents).map_err(|e| self.corrupt(e.to_string()))?;
        let found = value
            .get("schema_version")
            .and_then(serde_json::Value::as_u64)
            .ok_or_else(|| self.corrupt("missing schema_version".into()))?;
        if found != u64::from(SCHEMA_VERSION) {
            return Err(PersistError::UnsupportedSchema {
                found: u32::try_from(found).unwrap_or(u32::MAX),
                expected: SCHEMA_VERSION,
            });
        }

        let snapshot: PersistedSnapshot =
            serde_json::from_value(value).map_err(|e| self.corrupt(e.to_string()))?;
        let mean = snapshot.long_term.running_mean_score;
        if !mean.is_finite() || !(0.0..=100.0).contains(&mean) {
            return Err(self.corrupt(format!("running_mean_score out of range: {mean}")));
        }
        Ok(Some(snapshot))
    }

    /// Atomically replace the snapshot file.
    pub fn save(&self, snapshot: &PersistedSnapshot) -> Result<(), PersistError> {
        let json = serde_json::to_vec_pretty(snapshot)?;
        let _guard = self.write_lock.lock();

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| self.io(parent, e))?;
        }

        let tmp_path = self.tmp_path();
        let mut file = std::fs::File::create(&tmp_path).map_err(|e| self.io(&tmp_path, e))?;
        file.write_all(&json).map_err(|e| self.io(&tmp_path, e))?;
        file.sync_all().map_err(|e| self.io(&tmp_path, e))?;
        drop(file);

        std::fs::rename(&tmp_path, &self.path).map_err(|e| self.io(&self.path, e))?;
        tracing::debug!(path = %self.path.display(), bytes = json.len(), "memory snapshot written");
        Ok(())
    }

    /// Run [`save`](Self::save) on the blocking pool, bounded by `timeout`.
    pub async fn save_with_timeout(
        &self,
        snapshot: PersistedSnapshot,
        timeout: Duration,
    ) -> Result<(), PersistError> {
        let manager = self.clone();
        let task = tokio::task::spawn_blocking(move || manager.save(&snapshot));
        match tokio::time::timeout(timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join)) => Err(PersistError::Io {
                path: self.path.clone(),
                source: std::io::Error::other(join.to_string()),
            }),
            Err(_) => Err(PersistError::Timeout(timeout)),
        }
    }

    fn tmp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }

    fn corrupt(&self, reason: String) -> PersistError {
        PersistError::Corrupt {
            path: self.path.clone(),
            reason,
        }
    }

    fn io(&self, path: &Path, source: std::io::Error) -> PersistError {
        PersistError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_loads_as_none() {
        let tmp = TempDir::new().unwrap();
        let manager = PersistenceManager::new(tmp.path().join("memory.json"));
        assert!(manager.try_load().unwrap().is_none());
        assert!(manager.load().is_none());
    }

    #[test]
    fn save_creates_parent_and_leaves_no_temp_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("nested").join("memory.json");
        let manager = PersistenceManager::new(&path);

        manager.save(&PersistedSnapshot::empty()).unwrap();

        assert!(path.exists());
        assert!(!tmp.path().join("nested").join("memory.json.tmp").exists());
        assert_eq!(manager.try_load().unwrap(), Some(PersistedSnapshot::empty()));
    }

    #[test]
    fn garbage_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("memory.json");
        std::fs::write(&path, "{ not json").unwrap();
        let manager = PersistenceManager::new(&path);
        assert!(matches!(manager.try_load(), Err(PersistError::Corrupt { .. })));
        assert!(manager.load().is_none());
    }

    #[test]
    fn newer_schema_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("memory.json");
        std::fs::write(
            &path,
            r#"{"schema_version": 7, "short_term": [], "long_term": {"total_events": 0, "running_mean_score": 0.0}}"#,
        )
        .unwrap();
        let manager = PersistenceManager::new(&path);
        assert!(matches!(
            manager.try_load(),
            Err(PersistError::UnsupportedSchema { found: 7, expected: 1 })
        ));
    }

    #[test]
    fn minimal_v1_document_loads_with_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("memory.json");
        std::fs::write(
            &path,
            r#"{"schema_version": 1, "short_term": [], "long_term": {"total_events": 3, "running_mean_score": 42.5}}"#,
        )
        .unwrap();
        let snapshot = PersistenceManager::new(&path).try_load().unwrap().unwrap();
        assert_eq!(snapshot.long_term.total_events, 3);
        assert!(snapshot.long_term.malicious_url_frequency.is_empty());
    }

    #[test]
    fn out_of_range_mean_is_corrupt() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("memory.json");
        std::fs::write(
            &path,
            r#"{"schema_version": 1, "short_term": [], "long_term": {"total_events": 1, "running_mean_score": 400.0}}"#,
        )
        .unwrap();
        assert!(matches!(
            PersistenceManager::new(&path).try_load(),
            Err(PersistError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn save_with_timeout_writes() {
        let tmp = TempDir::new().unwrap();
        let manager = PersistenceManager::new(tmp.path().join("memory.json"));
        manager
            .save_with_timeout(PersistedSnapshot::empty(), Duration::from_secs(5))
            .await
            .unwrap();
        assert!(manager.exists());
    }
}
