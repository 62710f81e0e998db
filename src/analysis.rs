//! Analyzer output types and the normalizer.
//!
//! Every analyzer (URL reputation, password strength, text classification)
//! hands the core an arbitrary JSON value. [`normalize`] is the single point
//! that turns that value into a well-formed [`AnalysisResult`]: scores are
//! clamped to `0..=100`, confidences to `0.0..=1.0`, and anything missing or
//! malformed becomes a neutral, flagged result instead of an error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::error::DecisionError;

/// Analyzer-specific scalar metadata, opaque to the decision core.
pub type Metadata = BTreeMap<String, Value>;

/// Metadata key set to `true` on results produced from unusable input.
pub const DEGRADED_KEY: &str = "degraded";
/// Metadata key describing why a result was degraded.
pub const DEGRADED_REASON_KEY: &str = "degraded_reason";

/// The closed set of signal types the agent understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InputKind {
    Url,
    Password,
    Text,
}

impl InputKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Url => "url",
            Self::Password => "password",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for InputKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InputKind {
    type Err = DecisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "url" => Ok(Self::Url),
            "password" => Ok(Self::Password),
            "text" => Ok(Self::Text),
            _ => Err(DecisionError::InvalidKind(s.to_string())),
        }
    }
}

/// Why a raw analyzer output could not be used as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degradation {
    /// No output at all (analyzer failed, timed out, or returned null).
    Missing,
    /// Output was not a JSON object.
    NotAnObject,
    /// Object had no `risk_score` field.
    MissingScore,
    /// `risk_score` was present but not a finite number.
    InvalidScore,
}

impl Degradation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Missing => "missing",
            Self::NotAnObject => "not_an_object",
            Self::MissingScore => "missing_score",
            Self::InvalidScore => "invalid_score",
        }
    }
}

/// One analyzer's result in canonical shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub kind: InputKind,
    /// Always within `0..=100` after normalization.
    pub risk_score: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl AnalysisResult {
    /// Neutral result used when an analyzer's output is unusable.
    pub fn degraded(kind: InputKind, reason: Degradation, mut metadata: Metadata) -> Self {
        metadata.insert(DEGRADED_KEY.into(), Value::Bool(true));
        metadata.insert(DEGRADED_REASON_KEY.into(), Value::String(reason.as_str().into()));
        Self {
            kind,
            risk_score: 0,
            confidence: Some(0.0),
            metadata,
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.metadata_bool(DEGRADED_KEY).unwrap_or(false)
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(Value::as_str)
    }

    pub fn metadata_bool(&self, key: &str) -> Option<bool> {
        self.metadata.get(key).and_then(Value::as_bool)
    }
}

/// Normalize one raw analyzer output. Never fails.
///
/// Accepts both the canonical `{kind, risk_score, confidence?, metadata?}`
/// shape and the flat dictionaries analyzers tend to return; any extra
/// top-level fields are folded into metadata. Composite metadata values are
/// kept as their JSON text so metadata stays a string-to-scalar mapping.
pub fn normalize(kind: InputKind, raw: Option<&Value>) -> AnalysisResult {
    let obj = match raw {
        None | Some(Value::Null) => {
            tracing::warn!(kind = %kind, "analyzer output missing, using neutral result");
            return AnalysisResult::degraded(kind, Degradation::Missing, Metadata::new());
        }
        Some(Value::Object(obj)) => obj,
        Some(_) => {
            tracing::warn!(kind = %kind, "analyzer output is not an object, using neutral result");
            return AnalysisResult::degraded(kind, Degradation::NotAnObject, Metadata::new());
        }
    };

    let mut metadata = Metadata::new();
    for (key, value) in obj {
        if matches!(key.as_str(), "kind" | "type" | "risk_score" | "confidence" | "metadata")
            || is_secret(kind, key)
            || is_reserved(key)
        {
            continue;
        }
        metadata.insert(key.clone(), scalarize(value));
    }
    if let Some(Value::Object(extra)) = obj.get("metadata") {
        for (key, value) in extra
            .iter()
            .filter(|(key, _)| !is_secret(kind, key) && !is_reserved(key))
        {
            metadata.insert(key.clone(), scalarize(value));
        }
    }

    if let Some(declared) = obj.get("kind").or_else(|| obj.get("type")).and_then(Value::as_str) {
        if declared != kind.as_str() {
            tracing::debug!(declared, expected = %kind, "analyzer kind mismatch, using request kind");
        }
    }

    let score = match obj.get("risk_score") {
        None | Some(Value::Null) => {
            tracing::warn!(kind = %kind, "analyzer output has no risk_score");
            return AnalysisResult::degraded(kind, Degradation::MissingScore, metadata);
        }
        Some(value) => match parse_score(value) {
            Some(score) => score,
            None => {
                tracing::warn!(kind = %kind, value = %value, "analyzer risk_score is not a number");
                return AnalysisResult::degraded(kind, Degradation::InvalidScore, metadata);
            }
        },
    };

    let confidence = obj
        .get("confidence")
        .and_then(number_like)
        .filter(|c| c.is_finite())
        .map(|c| c.clamp(0.0, 1.0));

    AnalysisResult {
        kind,
        risk_score: score,
        confidence,
        metadata,
    }
}

/// Echoed password text is dropped so it can never reach memory or disk.
fn is_secret(kind: InputKind, key: &str) -> bool {
    kind == InputKind::Password && matches!(key, "password" | "input")
}

/// Degradation flags are only ever set here, never taken from an analyzer.
fn is_reserved(key: &str) -> bool {
    matches!(key, DEGRADED_KEY | DEGRADED_REASON_KEY)
}

/// Round and clamp a score-like value into `0..=100`.
fn parse_score(value: &Value) -> Option<u8> {
    let n = number_like(value)?;
    if !n.is_finite() {
        return None;
    }
    Some(n.round().clamp(0.0, 100.0) as u8)
}

/// Numbers, or strings that parse as numbers (some analyzers stringify scores).
fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

fn scalarize(value: &Value) -> Value {
    match value {
        Value::Array(_) | Value::Object(_) => Value::String(value.to_string()),
        other => other.clone(),
    }
}
