//! The decision pipeline.
//!
//! [`DecisionAgent::decide`] runs normalize → aggregate → classify → compose
//! reasoning (bounded) → record into memory. The agent keeps no state of its
//! own between calls; the memory store and reasoning composer are injected.
//! Notifying responders is left to the caller.

use serde_json::Value;
use std::sync::Arc;

use crate::analysis::{normalize, AnalysisResult, InputKind};
use crate::decision::aggregate::combine;
use crate::decision::classify::classify;
use crate::decision::reasoning::ReasoningComposer;
use crate::decision::record::{DecisionDraft, DecisionRecord};
use crate::error::DecisionError;
use crate::memory::store::MemoryStore;

#[derive(Clone)]
pub struct DecisionAgent {
    memory: Arc<MemoryStore>,
    reasoning: ReasoningComposer,
}

impl DecisionAgent {
    pub fn new(memory: Arc<MemoryStore>, reasoning: ReasoningComposer) -> Self {
        Self { memory, reasoning }
    }

    pub fn memory(&self) -> &Arc<MemoryStore> {
        &self.memory
    }

    /// Score and classify raw analyzer outputs, explain, and remember the decision.
    ///
    /// An empty `raw` slice is treated as one missing analyzer result, so a
    /// decision is always produced. If the returned future is dropped before
    /// completion nothing is recorded.
    pub async fn decide(&self, kind: InputKind, raw: &[Value]) -> DecisionRecord {
        let results: Vec<AnalysisResult> = if raw.is_empty() {
            vec![normalize(kind, None)]
        } else {
            raw.iter().map(|r| normalize(kind, Some(r))).collect()
        };

        let combined_score = combine(&results);
        let action = classify(combined_score);
        let draft = DecisionDraft {
            input_kind: kind,
            combined_score,
            action,
            analyzer_snapshot: results,
        };

        let reason = self.reasoning.compose(&draft).await;
        let record = draft.finish(reason);

        tracing::info!(
            kind = %kind,
            score = combined_score,
            action = %action,
            analyzers = record.analyzer_snapshot().len(),
            "decision made"
        );

        let event = self.memory.record(record.clone());
        tracing::debug!(id = %event.id, seq = event.seq, "decision remembered");
        record
    }

    /// Like [`decide`](Self::decide) but with an unparsed kind.
    pub async fn decide_named(&self, kind: &str, raw: &[Value]) -> Result<DecisionRecord, DecisionError> {
        let kind: InputKind = kind.parse()?;
        Ok(self.decide(kind, raw).await)
    }

    /// Handle a routing request body.
    ///
    /// Shape: `{"type": "url|password|text", "analyzer": {...} | "analyzers": [...],
    /// "url"|"input": "..."}`. For URL requests the submitted URL is copied
    /// into each analyzer object lacking one, so the decision can be keyed by
    /// domain. Password and text inputs are never copied.
    pub async fn route(&self, body: &Value) -> Result<DecisionRecord, DecisionError> {
        let obj = body
            .as_object()
            .ok_or_else(|| DecisionError::MalformedRequest("body must be a JSON object".into()))?;
        let kind_name = obj
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| DecisionError::MalformedRequest("missing string field 'type'".into()))?;
        let kind: InputKind = kind_name.parse()?;

        let mut raw: Vec<Value> = match (obj.get("analyzers"), obj.get("analyzer")) {
            (Some(Value::Array(items)), _) => items.clone(),
            (_, Some(Value::Array(items))) => items.clone(),
            (_, Some(single)) => vec![single.clone()],
            (Some(other), None) => vec![other.clone()],
            (None, None) => Vec::new(),
        };

        if kind == InputKind::Url {
            let submitted = obj
                .get("url")
                .or_else(|| obj.get("input"))
                .and_then(Value::as_str);
            if let Some(url) = submitted {
                for item in &mut raw {
                    if let Some(map) = item.as_object_mut() {
                        if !map.contains_key("url") && !map.contains_key("input") {
                            map.insert("url".into(), Value::String(url.to_string()));
                        }
                    }
                }
            }
        }

        Ok(self.decide(kind, &raw).await)
    }
}
