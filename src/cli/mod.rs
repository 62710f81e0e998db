pub mod decide;
pub mod doctor;
pub mod export;
pub mod recent;
pub mod reset;
pub mod similar;
pub mod stats;

use anyhow::{Context, Result};

use vigil::config::VigilConfig;
use vigil::memory::store::{MemoryStore, SimilarityIndex};
use vigil::persist::{PersistedSnapshot, PersistenceManager};

fn persistence(config: &VigilConfig) -> PersistenceManager {
    PersistenceManager::new(config.resolved_memory_path())
}

/// Strictly load the snapshot for read-only commands. A missing file reads as
/// empty; a corrupt one is an error so the operator sees it.
fn load_snapshot(config: &VigilConfig) -> Result<PersistedSnapshot> {
    let manager = persistence(config);
    let snapshot = manager
        .try_load()
        .with_context(|| format!("cannot read memory at {} (try `vigil doctor`)", manager.path().display()))?;
    Ok(snapshot.unwrap_or_else(PersistedSnapshot::empty))
}

/// Rebuild a read-only store from disk with the configured similarity search.
fn load_store(config: &VigilConfig) -> Result<MemoryStore> {
    let similarity = SimilarityIndex::from_config(&config.similarity)?;
    Ok(MemoryStore::from_snapshot(
        load_snapshot(config)?,
        config.memory.short_term_capacity,
        similarity,
    ))
}

/// Shorten `s` to `max` characters for table output.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}…")
    }
}
