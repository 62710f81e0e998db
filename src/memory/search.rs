//! Similarity search over short-term memory.
//!
//! Vector search ranks events by a configurable [`DistanceMetric`] over their
//! similarity keys. When no comparable keys exist (capability disabled, or the
//! query carries no vector) the search falls back to exact matches on the
//! normalized [`SignalKey`], most recent first. Ties always break toward the
//! more recent event, so results are deterministic for a fixed memory state.

use serde::{Deserialize, Serialize};

use crate::decision::record::DecisionRecord;
use crate::memory::types::{MemoryEvent, SignalKey};

// ── Public types ──────────────────────────────────────────────────────────────

/// Distance between two similarity keys. Smaller is closer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`; `1.0` when either vector has zero norm.
    #[default]
    Cosine,
    Euclidean,
    Manhattan,
}

impl DistanceMetric {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Cosine => "cosine",
            Self::Euclidean => "euclidean",
            Self::Manhattan => "manhattan",
        }
    }

    /// Distance between equal-length vectors.
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f64 {
        let pairs = a.iter().zip(b).map(|(x, y)| (f64::from(*x), f64::from(*y)));
        match self {
            Self::Cosine => {
                let (dot, na, nb) = pairs.fold((0.0, 0.0, 0.0), |(dot, na, nb), (x, y)| {
                    (dot + x * y, na + x * x, nb + y * y)
                });
                if na == 0.0 || nb == 0.0 {
                    1.0
                } else {
                    1.0 - dot / (na.sqrt() * nb.sqrt())
                }
            }
            Self::Euclidean => pairs.map(|(x, y)| (x - y).powi(2)).sum::<f64>().sqrt(),
            Self::Manhattan => pairs.map(|(x, y)| (x - y).abs()).sum(),
        }
    }
}

impl std::fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What to look for: a vector, a signal, or both.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimilarityQuery {
    pub key: Option<Vec<f32>>,
    pub signal: Option<SignalKey>,
}

/// One search hit.
#[derive(Debug, Clone, Serialize)]
pub struct SimilarMatch {
    pub event: MemoryEvent,
    pub distance: f64,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Up to `k` nearest events, sorted by non-decreasing distance.
pub fn nearest<'a>(
    events: impl Iterator<Item = &'a MemoryEvent> + Clone,
    query: &SimilarityQuery,
    metric: DistanceMetric,
    k: usize,
) -> Vec<SimilarMatch> {
    if k == 0 {
        return Vec::new();
    }

    if let Some(key) = query.key.as_deref() {
        let mut scored: Vec<(f64, &MemoryEvent)> = events
            .clone()
            .filter_map(|e| {
                e.similarity_key
                    .as_deref()
                    .filter(|candidate| candidate.len() == key.len())
                    .map(|candidate| (metric.distance(key, candidate), e))
            })
            .collect();
        if !scored.is_empty() {
            scored.sort_by(|a, b| a.0.total_cmp(&b.0).then(b.1.seq.cmp(&a.1.seq)));
            return scored
                .into_iter()
                .take(k)
                .map(|(distance, e)| SimilarMatch {
                    event: e.clone(),
                    distance,
                })
                .collect();
        }
    }

    let Some(signal) = query.signal.as_ref() else {
        return Vec::new();
    };
    let mut exact: Vec<&MemoryEvent> = events
        .filter(|e| e.signal.as_ref() == Some(signal))
        .collect();
    exact.sort_by(|a, b| b.seq.cmp(&a.seq));
    exact
        .into_iter()
        .take(k)
        .map(|e| SimilarMatch {
            event: e.clone(),
            distance: 0.0,
        })
        .collect()
}

/// Text a similarity key is computed from: kind, signal, and string metadata.
pub fn fingerprint(record: &DecisionRecord, signal: Option<&SignalKey>) -> String {
    let mut parts = vec![record.input_kind().as_str().to_string()];
    if let Some(signal) = signal {
        parts.push(signal.as_str().to_string());
    }
    for result in record.analyzer_snapshot() {
        for value in result.metadata.values() {
            if let Some(s) = value.as_str() {
                parts.push(s.to_string());
            }
        }
    }
    parts.join(" ")
}
