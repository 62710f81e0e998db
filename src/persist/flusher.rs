//! Debounced background snapshotting.
//!
//! The flusher wakes on every memory mutation but only writes once
//! `every_updates` mutations have accumulated, or when the interval tick finds
//! unflushed changes. A failed or timed-out write leaves the generation
//! unflushed, so the next cycle retries. Shutdown performs a final flush.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::config::MemoryConfig;
use crate::memory::store::MemoryStore;
use crate::persist::PersistenceManager;

#[derive(Debug, Clone, Copy)]
pub struct FlushPolicy {
    pub every_updates: u64,
    pub interval: Duration,
    pub save_timeout: Duration,
}

impl FlushPolicy {
    pub fn from_config(config: &MemoryConfig) -> Self {
        Self {
            every_updates: config.flush_every_updates.max(1),
            interval: config.flush_interval(),
            save_timeout: config.save_timeout(),
        }
    }
}

/// Handle to the running flusher. Dropping it without [`shutdown`](Self::shutdown)
/// also stops the task, after one last flush.
pub struct FlushHandle {
    shutdown: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl FlushHandle {
    /// Stop the flusher and wait for its final write.
    pub async fn shutdown(mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Err(e) = (&mut self.task).await {
            tracing::warn!(error = %e, "memory flusher task failed");
        }
    }
}

/// Spawn the flusher on the current tokio runtime.
pub fn spawn(store: Arc<MemoryStore>, manager: PersistenceManager, policy: FlushPolicy) -> FlushHandle {
    let (tx, rx) = oneshot::channel();
    let task = tokio::spawn(run(store, manager, policy, rx));
    FlushHandle {
        shutdown: Some(tx),
        task,
    }
}

async fn run(
    store: Arc<MemoryStore>,
    manager: PersistenceManager,
    policy: FlushPolicy,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut flushed = store.generation();
    let mut ticker = tokio::time::interval(policy.interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    ticker.tick().await;

    tracing::debug!(
        every_updates = policy.every_updates,
        interval_secs = policy.interval.as_secs(),
        path = %manager.path().display(),
        "memory flusher started"
    );

    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = store.changed().notified() => {
                if store.generation().saturating_sub(flushed) >= policy.every_updates {
                    flush(&store, &manager, policy.save_timeout, &mut flushed).await;
                }
            }
            _ = ticker.tick() => {
                if store.generation() != flushed {
                    flush(&store, &manager, policy.save_timeout, &mut flushed).await;
                }
            }
        }
    }

    if store.generation() != flushed {
        flush(&store, &manager, policy.save_timeout, &mut flushed).await;
    }
    tracing::debug!("memory flusher stopped");
}

/// Write one snapshot. The store's lock is released before any I/O starts.
async fn flush(store: &MemoryStore, manager: &PersistenceManager, timeout: Duration, flushed: &mut u64) {
    let (snapshot, generation) = store.snapshot();
    match manager.save_with_timeout(snapshot, timeout).await {
        Ok(()) => {
            *flushed = generation;
            tracing::debug!(generation, "memory flushed");
        }
        Err(e) => tracing::warn!(error = &e as &dyn std::error::Error, generation, "memory flush failed, will retry"),
    }
}
