//! Downstream sinks for decisions.
//!
//! A [`Responder`] receives finished [`DecisionRecord`]s. [`ResponderSet::dispatch`]
//! runs every interested responder on its own task with a timeout and never
//! reports back to the caller: a slow or failing webhook can only produce a
//! warning in the log, never delay or alter a decision.

pub mod event_log;
pub mod webhook;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::config::ResponderConfig;
use crate::decision::classify::Action;
use crate::decision::record::DecisionRecord;

pub use event_log::EventLogResponder;
pub use webhook::{WebhookFormat, WebhookResponder};

#[async_trait]
pub trait Responder: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this responder cares about decisions with `action`. Alerts only by default.
    fn wants(&self, action: Action) -> bool {
        action == Action::Alert
    }

    async fn respond(&self, record: &DecisionRecord) -> anyhow::Result<()>;
}

#[derive(Clone, Default)]
pub struct ResponderSet {
    responders: Vec<Arc<dyn Responder>>,
    timeout: Duration,
}

impl ResponderSet {
    pub fn new(responders: Vec<Arc<dyn Responder>>, timeout: Duration) -> Self {
        Self { responders, timeout }
    }

    /// Build every responder the config enables.
    pub fn from_config(config: &ResponderConfig) -> anyhow::Result<Self> {
        let mut responders: Vec<Arc<dyn Responder>> = Vec::new();

        if let Some(url) = config.n8n_webhook_url.as_deref().filter(|u| !u.is_empty()) {
            responders.push(Arc::new(WebhookResponder::new(url, WebhookFormat::N8n, config.timeout())?));
        }
        if let Some(url) = config.slack_webhook_url.as_deref().filter(|u| !u.is_empty()) {
            responders.push(Arc::new(WebhookResponder::new(url, WebhookFormat::Slack, config.timeout())?));
        }
        if let Some(path) = config.events_db_path.as_deref().filter(|p| !p.is_empty()) {
            responders.push(Arc::new(EventLogResponder::open(crate::config::expand_tilde(path))?));
        }

        let names: Vec<&str> = responders.iter().map(|r| r.name()).collect();
        tracing::info!(responders = ?names, "responders configured");
        Ok(Self::new(responders, config.timeout()))
    }

    pub fn len(&self) -> usize {
        self.responders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responders.is_empty()
    }

    /// Hand `record` to every interested responder. Must be called from within
    /// a tokio runtime. The returned handles may be dropped.
    pub fn dispatch(&self, record: &DecisionRecord) -> Vec<JoinHandle<()>> {
        self.responders
            .iter()
            .filter(|r| r.wants(record.action()))
            .map(|responder| {
                let responder = Arc::clone(responder);
                let record = record.clone();
                let timeout = self.timeout;
                tokio::spawn(async move {
                    match tokio::time::timeout(timeout, responder.respond(&record)).await {
                        Ok(Ok(())) => tracing::debug!(responder = responder.name(), "responder notified"),
                        Ok(Err(e)) => {
                            tracing::warn!(responder = responder.name(), error = %e, "responder failed")
                        }
                        Err(_) => tracing::warn!(
                            responder = responder.name(),
                            timeout_ms = timeout.as_millis() as u64,
                            "responder timed out"
                        ),
                    }
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{normalize, InputKind};
    use crate::decision::classify::classify;
    use crate::decision::record::DecisionDraft;
    use parking_lot::Mutex;
    use serde_json::json;

    struct Recording {
        every_action: bool,
        seen: Mutex<Vec<u8>>,
    }

    #[async_trait]
    impl Responder for Recording {
        fn name(&self) -> &str {
            "recording"
        }

        fn wants(&self, action: Action) -> bool {
            self.every_action || action == Action::Alert
        }

        async fn respond(&self, record: &DecisionRecord) -> anyhow::Result<()> {
            self.seen.lock().push(record.combined_score());
            Ok(())
        }
    }

    struct Stuck;

    #[async_trait]
    impl Responder for Stuck {
        fn name(&self) -> &str {
            "stuck"
        }

        async fn respond(&self, _record: &DecisionRecord) -> anyhow::Result<()> {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        }
    }

    fn record(score: u8) -> DecisionRecord {
        DecisionDraft {
            input_kind: InputKind::Url,
            combined_score: score,
            action: classify(score),
            analyzer_snapshot: vec![normalize(InputKind::Url, Some(&json!({"risk_score": score})))],
        }
        .finish("test".into())
    }

    #[tokio::test]
    async fn alerts_reach_everyone_other_actions_only_the_interested() {
        let alerts = Arc::new(Recording { every_action: false, seen: Mutex::new(vec![]) });
        let all = Arc::new(Recording { every_action: true, seen: Mutex::new(vec![]) });
        let set = ResponderSet::new(
            vec![alerts.clone() as Arc<dyn Responder>, all.clone() as Arc<dyn Responder>],
            Duration::from_secs(1),
        );

        for score in [90u8, 50, 10] {
            for handle in set.dispatch(&record(score)) {
                handle.await.unwrap();
            }
        }

        assert_eq!(*alerts.seen.lock(), vec![90]);
        assert_eq!(*all.seen.lock(), vec![90, 50, 10]);
    }

    #[tokio::test]
    async fn stuck_responder_is_cut_off() {
        let set = ResponderSet::new(vec![Arc::new(Stuck)], Duration::from_millis(20));
        let handles = set.dispatch(&record(95));
        assert_eq!(handles.len(), 1);
        for handle in handles {
            tokio::time::timeout(Duration::from_secs(5), handle)
                .await
                .expect("dispatch task bounded by responder timeout")
                .unwrap();
        }
    }

    #[test]
    fn empty_config_builds_empty_set() {
        let set = ResponderSet::from_config(&ResponderConfig::default()).unwrap();
        assert!(set.is_empty());
    }
}
