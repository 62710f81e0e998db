#![allow(dead_code)]

use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

use vigil::analysis::{normalize, InputKind};
use vigil::decision::agent::DecisionAgent;
use vigil::decision::classify::classify;
use vigil::decision::reasoning::ReasoningComposer;
use vigil::decision::record::{DecisionDraft, DecisionRecord};
use vigil::memory::store::{MemoryStore, SimilarityIndex};
use vigil::persist::PersistenceManager;

/// A snapshot path inside a fresh temp dir. Keep the `TempDir` alive.
pub fn temp_memory_path() -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("memory_store.json");
    (tmp, path)
}

/// An in-memory store with exact-signal similarity only.
pub fn test_store(capacity: usize) -> Arc<MemoryStore> {
    Arc::new(MemoryStore::new(capacity, SimilarityIndex::disabled()))
}

/// An agent with template reasoning and no responders.
pub fn test_agent(memory: Arc<MemoryStore>) -> DecisionAgent {
    DecisionAgent::new(memory, ReasoningComposer::template_only())
}

/// Load-or-empty a store from `path`, as the server does at startup.
pub fn init_store(path: &Path, capacity: usize) -> (PersistenceManager, Arc<MemoryStore>) {
    let manager = PersistenceManager::new(path);
    let store = Arc::new(MemoryStore::init(&manager, capacity, SimilarityIndex::disabled()));
    (manager, store)
}

/// A finished record with a single analyzer result.
pub fn record(kind: InputKind, score: u8, extra: Value) -> DecisionRecord {
    let mut raw = json!({ "risk_score": score });
    if let (Some(raw), Some(extra)) = (raw.as_object_mut(), extra.as_object()) {
        raw.extend(extra.clone());
    }
    DecisionDraft {
        input_kind: kind,
        combined_score: score,
        action: classify(score),
        analyzer_snapshot: vec![normalize(kind, Some(&raw))],
    }
    .finish(format!("test decision {score}"))
}
