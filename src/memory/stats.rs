//! Incremental long-term statistics.
//!
//! Every recorded decision is folded into [`LongTermStats`] exactly once, at
//! record time. Ring eviction never touches these aggregates, and the mean is
//! never recomputed from history.

use crate::decision::classify::Action;
use crate::decision::record::DecisionRecord;
use crate::memory::types::{is_weak_category, LongTermStats, SignalKey};

impl LongTermStats {
    /// Fold one decision into the aggregates.
    pub fn fold(&mut self, record: &DecisionRecord, signal: Option<&SignalKey>) {
        self.total_events += 1;
        let score = f64::from(record.combined_score());
        self.running_mean_score += (score - self.running_mean_score) / self.total_events as f64;

        *self
            .action_counts
            .entry(record.action().as_str().to_string())
            .or_insert(0) += 1;

        match signal {
            Some(SignalKey::Url(domain)) => {
                if record.action() != Action::Ignore {
                    *self.malicious_url_frequency.entry(domain.clone()).or_insert(0) += 1;
                }
            }
            Some(SignalKey::PasswordWeakness(category)) => {
                if is_weak_category(category) {
                    *self
                        .password_weakness_frequency
                        .entry(category.clone())
                        .or_insert(0) += 1;
                }
            }
            Some(SignalKey::TextLabel(_)) | None => {}
        }
    }

    /// Most frequent malicious URL keys, count descending then key ascending.
    pub fn top_malicious_urls(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.malicious_url_frequency, n)
    }

    /// Most frequent password weakness categories.
    pub fn top_password_weaknesses(&self, n: usize) -> Vec<(String, u64)> {
        top_n(&self.password_weakness_frequency, n)
    }

    pub fn action_count(&self, action: Action) -> u64 {
        self.action_counts.get(action.as_str()).copied().unwrap_or(0)
    }
}

fn top_n(map: &std::collections::BTreeMap<String, u64>, n: usize) -> Vec<(String, u64)> {
    let mut entries: Vec<(String, u64)> = map.iter().map(|(k, v)| (k.clone(), *v)).collect();
    // BTreeMap iteration is key-ascending and the sort is stable.
    entries.sort_by(|a, b| b.1.cmp(&a.1));
    entries.truncate(n);
    entries
}
