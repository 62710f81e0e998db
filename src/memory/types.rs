//! Memory record types.
//!
//! Defines [`MemoryEvent`] (a stored decision), [`SignalKey`] (the normalized
//! signal a decision is about), and [`LongTermStats`] (running aggregates that
//! outlive the short-term ring).

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::analysis::{AnalysisResult, InputKind};
use crate::decision::record::DecisionRecord;

/// Password strength labels that count as a weakness.
const WEAK_STRENGTHS: [&str; 2] = ["very_weak", "weak"];
/// Category recorded for breached passwords whose strength label looks fine.
pub const COMPROMISED_CATEGORY: &str = "compromised";

/// The normalized signal a decision was about, one variant per input kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "key", rename_all = "snake_case")]
pub enum SignalKey {
    /// Host of the analyzed URL, lower-cased, without a leading `www.`.
    Url(String),
    /// Password strength category (`very_weak`, `weak`, `compromised`, ...).
    PasswordWeakness(String),
    /// Text classifier label (`malicious`, `suspicious`, `benign`).
    TextLabel(String),
}

impl SignalKey {
    /// Extract the signal from a decision's analyzer snapshot.
    pub fn from_record(record: &DecisionRecord) -> Option<Self> {
        let results = record.analyzer_snapshot();
        match record.input_kind() {
            InputKind::Url => results
                .iter()
                .find_map(|r| r.metadata_str("url").or_else(|| r.metadata_str("input")))
                .and_then(normalize_url_key)
                .map(Self::Url),
            InputKind::Password => results.iter().find_map(password_category).map(Self::PasswordWeakness),
            InputKind::Text => results
                .iter()
                .find_map(|r| r.metadata_str("label"))
                .map(|label| Self::TextLabel(label.trim().to_ascii_lowercase()))
                .filter(|s| !s.as_str().is_empty()),
        }
    }

    /// Build the signal an operator means when querying by free text.
    pub fn from_query(kind: InputKind, text: &str) -> Option<Self> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        Some(match kind {
            InputKind::Url => Self::Url(normalize_url_key(text)?),
            InputKind::Password => Self::PasswordWeakness(text.to_ascii_lowercase()),
            InputKind::Text => Self::TextLabel(text.to_ascii_lowercase()),
        })
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Url(key) | Self::PasswordWeakness(key) | Self::TextLabel(key) => key,
        }
    }
}

impl std::fmt::Display for SignalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Password categories that count toward the weakness table.
pub fn is_weak_category(category: &str) -> bool {
    category == COMPROMISED_CATEGORY || WEAK_STRENGTHS.contains(&category)
}

/// Host part of a URL, lower-cased with `www.` stripped.
///
/// Inputs without a scheme (`evil.example/login`) are parsed as `http://`;
/// anything still unparsable falls back to its trimmed, lower-cased text.
pub fn normalize_url_key(raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    let parsed = url::Url::parse(raw)
        .ok()
        .filter(|u| u.host_str().is_some())
        .or_else(|| url::Url::parse(&format!("http://{raw}")).ok());
    let key = match parsed.as_ref().and_then(|u| u.host_str()) {
        Some(host) => host.to_ascii_lowercase(),
        None => raw.to_ascii_lowercase(),
    };
    Some(key.strip_prefix("www.").map(str::to_string).unwrap_or(key))
}

fn password_category(result: &AnalysisResult) -> Option<String> {
    let strength = result
        .metadata_str("strength")
        .map(|s| s.trim().to_ascii_lowercase())
        .filter(|s| !s.is_empty());
    let compromised = result.metadata_bool("compromised").unwrap_or(false);
    match strength {
        Some(s) if WEAK_STRENGTHS.contains(&s.as_str()) => Some(s),
        _ if compromised => Some(COMPROMISED_CATEGORY.to_string()),
        other => other,
    }
}

/// A stored decision, time-ordered by `seq`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryEvent {
    /// UUID v7 (time-sortable).
    pub id: String,
    /// 1-based position in the all-time event stream.
    pub seq: u64,
    pub record: DecisionRecord,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<SignalKey>,
    /// Embedding or feature fingerprint used for similarity search.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similarity_key: Option<Vec<f32>>,
}

/// Running aggregates over every event ever recorded.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LongTermStats {
    pub total_events: u64,
    /// Incrementally maintained mean of all combined scores.
    pub running_mean_score: f64,
    #[serde(default)]
    pub malicious_url_frequency: BTreeMap<String, u64>,
    #[serde(default)]
    pub password_weakness_frequency: BTreeMap<String, u64>,
    /// Decisions per action (`alert`, `log`, `ignore`).
    #[serde(default)]
    pub action_counts: BTreeMap<String, u64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize;
    use crate::decision::classify::Action;
    use crate::decision::record::DecisionDraft;
    use serde_json::{json, Value};

    fn record(kind: InputKind, raw: Value) -> DecisionRecord {
        DecisionDraft {
            input_kind: kind,
            combined_score: 50,
            action: Action::Log,
            analyzer_snapshot: vec![normalize(kind, Some(&raw))],
        }
        .finish(String::new())
    }

    #[test]
    fn url_keys_are_hosts() {
        assert_eq!(normalize_url_key("https://WWW.Evil.Example/login?x=1").as_deref(), Some("evil.example"));
        assert_eq!(normalize_url_key("evil.example/path").as_deref(), Some("evil.example"));
        assert_eq!(normalize_url_key("  ").as_deref(), None);
    }

    #[test]
    fn url_signal_reads_url_or_input() {
        let r = record(InputKind::Url, json!({"risk_score": 80, "url": "http://bad.example/a"}));
        assert_eq!(SignalKey::from_record(&r), Some(SignalKey::Url("bad.example".into())));
        let r = record(InputKind::Url, json!({"risk_score": 80, "input": "http://other.example"}));
        assert_eq!(SignalKey::from_record(&r), Some(SignalKey::Url("other.example".into())));
        let r = record(InputKind::Url, json!({"risk_score": 80}));
        assert_eq!(SignalKey::from_record(&r), None);
    }

    #[test]
    fn password_categories() {
        let r = record(InputKind::Password, json!({"risk_score": 90, "strength": "very_weak"}));
        let signal = SignalKey::from_record(&r).unwrap();
        assert_eq!(signal, SignalKey::PasswordWeakness("very_weak".into()));
        assert!(is_weak_category(signal.as_str()));

        let r = record(InputKind::Password, json!({"risk_score": 100, "strength": "strong", "compromised": true}));
        assert_eq!(SignalKey::from_record(&r), Some(SignalKey::PasswordWeakness("compromised".into())));
        assert!(is_weak_category(COMPROMISED_CATEGORY));

        let r = record(InputKind::Password, json!({"risk_score": 5, "strength": "strong"}));
        let signal = SignalKey::from_record(&r).unwrap();
        assert!(!is_weak_category(signal.as_str()));
    }

    #[test]
    fn text_signal_is_label() {
        let r = record(InputKind::Text, json!({"risk_score": 80, "label": "Malicious"}));
        assert_eq!(SignalKey::from_record(&r), Some(SignalKey::TextLabel("malicious".into())));
    }

    #[test]
    fn signal_serializes_tagged() {
        let v = serde_json::to_value(SignalKey::Url("a.example".into())).unwrap();
        assert_eq!(v, json!({"kind": "url", "key": "a.example"}));
    }
}
