//! CLI `decide` command: score analyzer results given on the command line.

use anyhow::{Context, Result};
use serde_json::{json, Value};
use std::sync::Arc;

use vigil::config::VigilConfig;
use vigil::decision::agent::DecisionAgent;
use vigil::decision::reasoning::ReasoningComposer;
use vigil::decision::record::DecisionPayload;
use vigil::memory::store::{MemoryStore, SimilarityIndex};
use vigil::responders::ResponderSet;

/// Decide once, remember the decision, and wait for responders before exiting.
pub async fn decide(config: &VigilConfig, kind: &str, results: &[String], input: Option<&str>) -> Result<()> {
    let payload = decide_once(config, kind, results, input).await?;
    println!("{}", serde_json::to_string_pretty(&payload)?);
    Ok(())
}

/// Only bad arguments fail; a snapshot that cannot be written is logged and
/// the decision still comes back.
async fn decide_once(
    config: &VigilConfig,
    kind: &str,
    results: &[String],
    input: Option<&str>,
) -> Result<DecisionPayload> {
    let analyzers = results
        .iter()
        .map(|r| serde_json::from_str::<Value>(r).with_context(|| format!("--result is not valid JSON: {r}")))
        .collect::<Result<Vec<_>>>()?;

    let manager = super::persistence(config);
    let similarity = SimilarityIndex::from_config(&config.similarity)?;
    let memory = Arc::new(MemoryStore::init(&manager, config.memory.short_term_capacity, similarity));
    let agent = DecisionAgent::new(Arc::clone(&memory), ReasoningComposer::from_config(&config.reasoning)?);

    let mut body = json!({ "type": kind, "analyzers": analyzers });
    if let Some(input) = input {
        body["input"] = Value::String(input.to_string());
    }
    let record = agent.route(&body).await?;

    if let Err(e) = manager
        .save_with_timeout(memory.snapshot().0, config.memory.save_timeout())
        .await
    {
        tracing::warn!(
            error = &e as &dyn std::error::Error,
            path = %manager.path().display(),
            "failed to persist memory, decision kept in memory only"
        );
    }

    let responders = ResponderSet::from_config(&config.responders)?;
    for handle in responders.dispatch(&record) {
        let _ = handle.await;
    }

    Ok(record.to_payload())
}
