//! Post-hoc explanations for decisions.
//!
//! A [`ReasoningComposer`] asks an optional [`ReasoningProvider`] to explain a
//! [`DecisionDraft`] under a hard timeout, and falls back to a deterministic
//! template when the provider is absent, slow, or fails. The draft is only
//! ever borrowed, so no provider can change the score or action.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ReasoningConfig;
use crate::decision::classify::{Action, ALERT_ABOVE, LOG_FROM};
use crate::decision::record::DecisionDraft;
use crate::error::ReasoningError;

/// A language-generation capability that can explain a decision.
#[async_trait]
pub trait ReasoningProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn explain(&self, draft: &DecisionDraft) -> Result<String, ReasoningError>;
}

/// Bounded, best-effort reason composition.
#[derive(Clone)]
pub struct ReasoningComposer {
    provider: Option<Arc<dyn ReasoningProvider>>,
    timeout: Duration,
}

impl ReasoningComposer {
    /// Composer that always uses the template reason.
    pub fn template_only() -> Self {
        Self {
            provider: None,
            timeout: Duration::ZERO,
        }
    }

    pub fn new(provider: Arc<dyn ReasoningProvider>, timeout: Duration) -> Self {
        Self {
            provider: Some(provider),
            timeout,
        }
    }

    /// Build from config. `"openai"` without an API key degrades to the template.
    pub fn from_config(config: &ReasoningConfig) -> anyhow::Result<Self> {
        match config.provider.as_str() {
            "template" | "none" => Ok(Self::template_only()),
            "openai" => {
                if config.api_key.is_empty() {
                    tracing::warn!("openai reasoning configured without an API key, using template reasons");
                    return Ok(Self::template_only());
                }
                let provider = OpenAiReasoner::new(config)?;
                Ok(Self::new(Arc::new(provider), config.timeout()))
            }
            other => anyhow::bail!("unknown reasoning provider: {other}. Supported: template, openai"),
        }
    }

    /// Explain the draft. Never fails and never waits longer than the timeout.
    pub async fn compose(&self, draft: &DecisionDraft) -> String {
        let Some(provider) = &self.provider else {
            return template_reason(draft);
        };

        let outcome = match tokio::time::timeout(self.timeout, provider.explain(draft)).await {
            Ok(Ok(reason)) if !reason.trim().is_empty() => Ok(reason.trim().to_string()),
            Ok(Ok(_)) => Err(ReasoningError::Empty),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(ReasoningError::Timeout(self.timeout)),
        };

        match outcome {
            Ok(reason) => reason,
            Err(e) => {
                tracing::warn!(provider = provider.name(), error = %e, "reasoning fell back to template");
                template_reason(draft)
            }
        }
    }
}

/// Deterministic reason built from kind, score, action, and well-known analyzer hints.
pub fn template_reason(draft: &DecisionDraft) -> String {
    let kind = draft.input_kind;
    let score = draft.combined_score;
    let mut reason = match draft.action {
        Action::Alert => format!("{kind} risk score {score} is above {ALERT_ABOVE}; raising alert"),
        Action::Log => format!("{kind} risk score {score} is within {LOG_FROM}-{ALERT_ABOVE}; logging for review"),
        Action::Ignore => format!("{kind} risk score {score} is below {LOG_FROM}; ignoring"),
    };

    let hints: Vec<String> = draft
        .analyzer_snapshot
        .iter()
        .flat_map(|r| {
            ["label", "strength", "compromised"]
                .into_iter()
                .filter_map(move |key| r.metadata.get(key).map(|v| format!("{key}={}", scalar_text(v))))
        })
        .collect();
    if !hints.is_empty() {
        reason.push_str(&format!(" ({})", hints.join(", ")));
    }

    let degraded = draft.degraded_count();
    if degraded > 0 {
        reason.push_str(&format!(
            "; {degraded} of {} analyzer result(s) unavailable",
            draft.analyzer_snapshot.len()
        ));
    }
    reason
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Explanations from an OpenAI-compatible chat-completions endpoint.
pub struct OpenAiReasoner {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: String,
}

impl OpenAiReasoner {
    pub fn new(config: &ReasoningConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout()).build()?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    fn prompt(draft: &DecisionDraft) -> String {
        let snapshot = serde_json::to_string(&draft.analyzer_snapshot).unwrap_or_default();
        format!(
            "A {} input was scored {} out of 100 and the action '{}' was chosen. \
             Analyzer output: {snapshot}\n\
             In one or two sentences, explain the likely threat to a security analyst. \
             Do not propose a different score or action.",
            draft.input_kind, draft.combined_score, draft.action
        )
    }
}

#[async_trait]
impl ReasoningProvider for OpenAiReasoner {
    fn name(&self) -> &str {
        "openai"
    }

    async fn explain(&self, draft: &DecisionDraft) -> Result<String, ReasoningError> {
        let body = json!({
            "model": self.model,
            "temperature": 0.0,
            "max_tokens": 120,
            "messages": [
                {"role": "system", "content": "You are a concise security assistant."},
                {"role": "user", "content": Self::prompt(draft)},
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ReasoningError::Provider(e.to_string()))?
            .error_for_status()
            .map_err(|e| ReasoningError::Provider(e.to_string()))?;

        let value: Value = response
            .json()
            .await
            .map_err(|e| ReasoningError::Provider(e.to_string()))?;

        value["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or(ReasoningError::Empty)
    }
}
