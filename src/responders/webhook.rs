//! HTTP webhook responders (n8n workflows and Slack incoming webhooks).

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use super::Responder;
use crate::decision::record::DecisionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookFormat {
    /// The full decision payload as JSON.
    N8n,
    /// A `{"text": ...}` chat message.
    Slack,
}

pub struct WebhookResponder {
    client: reqwest::Client,
    url: url::Url,
    format: WebhookFormat,
}

impl WebhookResponder {
    pub fn new(url: &str, format: WebhookFormat, timeout: Duration) -> Result<Self> {
        let url = url::Url::parse(url).with_context(|| format!("invalid webhook URL: {url}"))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self { client, url, format })
    }

    fn body(&self, record: &DecisionRecord) -> Result<Value> {
        Ok(match self.format {
            WebhookFormat::N8n => serde_json::to_value(record.to_payload())?,
            WebhookFormat::Slack => json!({ "text": slack_message(record) }),
        })
    }
}

/// One-line alert text for chat channels.
pub fn slack_message(record: &DecisionRecord) -> String {
    format!(
        ":rotating_light: Vigil {} on {} input (score {}): {}",
        record.action(),
        record.input_kind(),
        record.combined_score(),
        record.reason()
    )
}

#[async_trait]
impl Responder for WebhookResponder {
    fn name(&self) -> &str {
        match self.format {
            WebhookFormat::N8n => "n8n",
            WebhookFormat::Slack => "slack",
        }
    }

    async fn respond(&self, record: &DecisionRecord) -> Result<()> {
        let body = self.body(record)?;
        self.client
            .post(self.url.clone())
            .json(&body)
            .send()
            .await
            .with_context(|| format!("POST to {} failed", self.url))?
            .error_for_status()
            .context("webhook rejected the decision")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{normalize, InputKind};
    use crate::decision::classify::Action;
    use crate::decision::record::DecisionDraft;

    fn alert() -> DecisionRecord {
        DecisionDraft {
            input_kind: InputKind::Url,
            combined_score: 88,
            action: Action::Alert,
            analyzer_snapshot: vec![normalize(InputKind::Url, Some(&json!({"risk_score": 88})))],
        }
        .finish("known phishing host".into())
    }

    #[test]
    fn rejects_bad_urls() {
        assert!(WebhookResponder::new("not a url", WebhookFormat::N8n, Duration::from_secs(1)).is_err());
    }

    #[test]
    fn bodies_per_format() {
        let record = alert();
        let n8n = WebhookResponder::new("http://localhost/hook", WebhookFormat::N8n, Duration::from_secs(1)).unwrap();
        let body = n8n.body(&record).unwrap();
        assert_eq!(body["type"], "url");
        assert_eq!(body["action"], "alert");

        let slack = WebhookResponder::new("http://localhost/hook", WebhookFormat::Slack, Duration::from_secs(1)).unwrap();
        let text = slack.body(&record).unwrap()["text"].as_str().unwrap().to_string();
        assert!(text.contains("score 88"));
        assert!(text.contains("known phishing host"));
    }
}
