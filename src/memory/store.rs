//! The process-wide memory store.
//!
//! [`MemoryStore`] owns the short-term ring and the long-term statistics
//! behind one reader-writer lock: [`record`](MemoryStore::record) is the only
//! writer, and every read sees either all or none of a recorded event. The
//! similarity key is computed before the lock is taken, and nothing here does
//! I/O. Persistence watches [`changed`](MemoryStore::changed) and snapshots
//! on its own schedule.

use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::Notify;

use crate::analysis::InputKind;
use crate::decision::record::DecisionRecord;
use crate::config::SimilarityConfig;
use crate::embedding::{self, EmbeddingProvider};
use crate::memory::ring::ShortTermRing;
use crate::memory::search::{self, DistanceMetric, SimilarMatch, SimilarityQuery};
use crate::memory::types::{LongTermStats, MemoryEvent, SignalKey};
use crate::persist::{PersistedSnapshot, PersistenceManager, SCHEMA_VERSION};

/// The similarity capability: an optional key source plus a metric.
#[derive(Clone, Default)]
pub struct SimilarityIndex {
    provider: Option<Arc<dyn EmbeddingProvider>>,
    metric: DistanceMetric,
}

impl SimilarityIndex {
    pub fn new(provider: Option<Arc<dyn EmbeddingProvider>>, metric: DistanceMetric) -> Self {
        Self { provider, metric }
    }

    /// Build the configured key source and metric.
    pub fn from_config(config: &SimilarityConfig) -> anyhow::Result<Self> {
        let provider: Option<Arc<dyn EmbeddingProvider>> = embedding::create_provider(config)?.map(Arc::from);
        Ok(Self::new(provider, config.metric))
    }

    /// Exact-signal lookups only.
    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.provider.is_some()
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    fn key_for(&self, text: &str) -> Option<Vec<f32>> {
        let provider = self.provider.as_ref()?;
        match provider.embed(text) {
            Ok(key) => Some(key),
            Err(e) => {
                tracing::warn!(error = %e, "similarity key unavailable");
                None
            }
        }
    }
}

struct MemoryState {
    ring: ShortTermRing,
    stats: LongTermStats,
    /// Bumped on every mutation; the flusher compares it to what it last wrote.
    generation: u64,
}

pub struct MemoryStore {
    state: RwLock<MemoryState>,
    similarity: SimilarityIndex,
    changed: Notify,
}

impl MemoryStore {
    /// An empty store.
    pub fn new(capacity: usize, similarity: SimilarityIndex) -> Self {
        Self::from_snapshot(PersistedSnapshot::empty(), capacity, similarity)
    }

    /// Rebuild from a loaded snapshot. Excess ring entries keep the newest.
    pub fn from_snapshot(snapshot: PersistedSnapshot, capacity: usize, similarity: SimilarityIndex) -> Self {
        if snapshot.short_term.len() > capacity {
            tracing::warn!(
                stored = snapshot.short_term.len(),
                capacity,
                "snapshot ring larger than capacity, keeping newest events"
            );
        }
        Self {
            state: RwLock::new(MemoryState {
                ring: ShortTermRing::from_events(capacity, snapshot.short_term),
                stats: snapshot.long_term,
                generation: 0,
            }),
            similarity,
            changed: Notify::new(),
        }
    }

    /// Startup hook: load the snapshot or start empty, creating the file on
    /// first run. Never fails.
    pub fn init(persistence: &PersistenceManager, capacity: usize, similarity: SimilarityIndex) -> Self {
        let first_run = !persistence.exists();
        let snapshot = persistence.load().unwrap_or_else(PersistedSnapshot::empty);
        let store = Self::from_snapshot(snapshot, capacity, similarity);
        if first_run {
            if let Err(e) = persistence.save(&store.snapshot().0) {
                tracing::warn!(error = &e as &dyn std::error::Error, "could not create memory snapshot");
            }
        }
        store
    }

    /// Store a decision and fold it into long-term statistics.
    ///
    /// Infallible: the in-memory state is authoritative and persistence is
    /// only signalled, never awaited.
    pub fn record(&self, record: DecisionRecord) -> MemoryEvent {
        let signal = SignalKey::from_record(&record);
        let similarity_key = self
            .similarity
            .key_for(&search::fingerprint(&record, signal.as_ref()));

        let event = {
            let mut state = self.state.write();
            state.stats.fold(&record, signal.as_ref());
            let event = MemoryEvent {
                id: uuid::Uuid::now_v7().to_string(),
                seq: state.stats.total_events,
                record,
                signal,
                similarity_key,
            };
            if let Some(evicted) = state.ring.push(event.clone()) {
                tracing::debug!(seq = evicted.seq, "evicted oldest short-term event");
            }
            state.generation += 1;
            event
        };

        self.changed.notify_one();
        event
    }

    /// Up to `limit` events, most recent first.
    pub fn recent_events(&self, limit: usize) -> Vec<MemoryEvent> {
        self.state.read().ring.recent(limit)
    }

    /// Up to `k` nearest events by the configured metric, or exact signal
    /// matches when no comparable similarity keys exist.
    pub fn similar(&self, query: &SimilarityQuery, k: usize) -> Vec<SimilarMatch> {
        let state = self.state.read();
        search::nearest(state.ring.iter(), query, self.similarity.metric, k)
    }

    /// Query from operator text, e.g. a URL, a strength label, or a phrase.
    pub fn query_for_text(&self, kind: InputKind, text: &str) -> SimilarityQuery {
        let signal = SignalKey::from_query(kind, text);
        let mut fingerprint = kind.as_str().to_string();
        if let Some(signal) = &signal {
            fingerprint.push(' ');
            fingerprint.push_str(signal.as_str());
        }
        fingerprint.push(' ');
        fingerprint.push_str(text);
        SimilarityQuery {
            key: self.similarity.key_for(&fingerprint),
            signal,
        }
    }

    /// Read-only copy of the long-term statistics.
    pub fn stats(&self) -> LongTermStats {
        self.state.read().stats.clone()
    }

    /// Consistent copy of the whole state plus the generation it reflects.
    pub fn snapshot(&self) -> (PersistedSnapshot, u64) {
        let state = self.state.read();
        let snapshot = PersistedSnapshot {
            schema_version: SCHEMA_VERSION,
            short_term: state.ring.iter().cloned().collect(),
            long_term: state.stats.clone(),
        };
        (snapshot, state.generation)
    }

    pub fn generation(&self) -> u64 {
        self.state.read().generation
    }

    pub fn capacity(&self) -> usize {
        self.state.read().ring.capacity()
    }

    pub fn len(&self) -> usize {
        self.state.read().ring.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state.read().ring.is_empty()
    }

    /// Signalled after every mutation.
    pub fn changed(&self) -> &Notify {
        &self.changed
    }
}
