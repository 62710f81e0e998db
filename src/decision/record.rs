//! The decision record and its outbound payload.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::analysis::{AnalysisResult, InputKind};
use crate::decision::classify::Action;

/// A decision whose score and action are fixed but whose reason is not yet written.
///
/// Reasoning providers only ever see a shared reference to a draft, so they
/// cannot alter the authoritative score or action.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionDraft {
    pub input_kind: InputKind,
    pub combined_score: u8,
    pub action: Action,
    pub analyzer_snapshot: Vec<AnalysisResult>,
}

impl DecisionDraft {
    /// Seal the draft with its explanation.
    pub fn finish(self, reason: String) -> DecisionRecord {
        DecisionRecord {
            input_kind: self.input_kind,
            combined_score: self.combined_score,
            action: self.action,
            reason,
            analyzer_snapshot: self.analyzer_snapshot,
            timestamp: Utc::now(),
        }
    }

    pub fn degraded_count(&self) -> usize {
        self.analyzer_snapshot.iter().filter(|r| r.is_degraded()).count()
    }
}

/// An immutable, auditable decision. Fields are read through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    input_kind: InputKind,
    combined_score: u8,
    action: Action,
    reason: String,
    analyzer_snapshot: Vec<AnalysisResult>,
    timestamp: DateTime<Utc>,
}

impl DecisionRecord {
    pub fn input_kind(&self) -> InputKind {
        self.input_kind
    }

    pub fn combined_score(&self) -> u8 {
        self.combined_score
    }

    pub fn action(&self) -> Action {
        self.action
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn analyzer_snapshot(&self) -> &[AnalysisResult] {
        &self.analyzer_snapshot
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// The JSON shape forwarded to the API layer and responders.
    pub fn to_payload(&self) -> DecisionPayload {
        let analyzer = match self.analyzer_snapshot.as_slice() {
            [only] => serde_json::to_value(only).unwrap_or(Value::Null),
            many => serde_json::to_value(many).unwrap_or(Value::Null),
        };
        DecisionPayload {
            input_type: self.input_kind,
            combined_score: self.combined_score,
            action: self.action,
            reason: self.reason.clone(),
            analyzer,
            timestamp: self.timestamp.to_rfc3339(),
        }
    }
}

/// Outbound decision payload.
#[derive(Debug, Clone, Serialize)]
pub struct DecisionPayload {
    #[serde(rename = "type")]
    pub input_type: InputKind,
    pub combined_score: u8,
    pub action: Action,
    pub reason: String,
    /// The single analyzer result, or an array when several produced the decision.
    pub analyzer: Value,
    pub timestamp: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::normalize;
    use serde_json::json;

    #[test]
    fn payload_uses_wire_names() {
        let draft = DecisionDraft {
            input_kind: InputKind::Url,
            combined_score: 85,
            action: Action::Alert,
            analyzer_snapshot: vec![normalize(InputKind::Url, Some(&json!({"risk_score": 85})))],
        };
        let record = draft.finish("bad host".into());
        let payload = serde_json::to_value(record.to_payload()).unwrap();
        assert_eq!(payload["type"], "url");
        assert_eq!(payload["combined_score"], 85);
        assert_eq!(payload["action"], "alert");
        assert_eq!(payload["reason"], "bad host");
        assert_eq!(payload["analyzer"]["risk_score"], 85);
    }

    #[test]
    fn multiple_results_serialize_as_array() {
        let draft = DecisionDraft {
            input_kind: InputKind::Text,
            combined_score: 40,
            action: Action::Log,
            analyzer_snapshot: vec![
                normalize(InputKind::Text, Some(&json!({"risk_score": 60}))),
                normalize(InputKind::Text, None),
            ],
        };
        assert_eq!(draft.degraded_count(), 1);
        let payload = draft.finish(String::new()).to_payload();
        assert_eq!(payload.analyzer.as_array().map(Vec::len), Some(2));
    }
}
