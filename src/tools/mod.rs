pub mod decide;
pub mod memory_stats;
pub mod recent_events;
pub mod similar_events;

use decide::DecideParams;
use memory_stats::MemoryStatsParams;
use recent_events::RecentEventsParams;
use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::{tool, tool_handler, tool_router, ServerHandler};
use serde_json::{json, Value};
use similar_events::SimilarEventsParams;

use vigil::analysis::InputKind;
use vigil::decision::agent::DecisionAgent;
use vigil::memory::search::SimilarMatch;
use vigil::memory::store::MemoryStore;
use vigil::memory::types::MemoryEvent;
use vigil::responders::ResponderSet;

const DEFAULT_RECENT: usize = 10;
const DEFAULT_TOP: usize = 5;
const DEFAULT_K: usize = 5;

/// The Vigil MCP tool handler. Holds the [`DecisionAgent`] (and through it the
/// memory store) plus the responders, and exposes the tools via the
/// `#[tool_router]` macro.
#[derive(Clone)]
pub struct VigilTools {
    tool_router: ToolRouter<Self>,
    agent: DecisionAgent,
    responders: ResponderSet,
}

#[tool_router]
impl VigilTools {
    pub fn new(agent: DecisionAgent, responders: ResponderSet) -> Self {
        Self {
            tool_router: Self::tool_router(),
            agent,
            responders,
        }
    }

    /// Score, classify, and explain analyzer results.
    #[tool(description = "Combine analyzer results for a url, password, or text input into a risk score (0-100) and an action: alert (>70), log (30-70), or ignore (<30). The decision is remembered.")]
    async fn decide(&self, Parameters(params): Parameters<DecideParams>) -> Result<String, String> {
        tracing::info!(
            kind = %params.r#type,
            analyzers = params.analyzers.len(),
            "decide called"
        );

        let mut body = json!({
            "type": params.r#type,
            "analyzers": params.analyzers,
        });
        if let Some(input) = params.input {
            body["input"] = Value::String(input);
        }

        let record = self.agent.route(&body).await.map_err(|e| e.to_string())?;
        self.responders.dispatch(&record);
        serde_json::to_string(&record.to_payload()).map_err(|e| format!("serialization failed: {e}"))
    }

    /// List the most recent decisions in short-term memory.
    #[tool(description = "List recent decisions from short-term memory (last 30 at most), most recent first.")]
    async fn recent_events(&self, Parameters(params): Parameters<RecentEventsParams>) -> Result<String, String> {
        let limit = params.limit.unwrap_or(DEFAULT_RECENT);
        tracing::info!(limit, "recent_events called");
        Ok(recent_view(self.agent.memory(), limit).to_string())
    }

    /// Long-term aggregates.
    #[tool(description = "Get long-term memory statistics: total decisions, running mean score, action counts, most frequent malicious domains and password weaknesses.")]
    async fn memory_stats(&self, Parameters(params): Parameters<MemoryStatsParams>) -> Result<String, String> {
        tracing::info!("memory_stats called");
        Ok(stats_view(self.agent.memory(), params.top.unwrap_or(DEFAULT_TOP)).to_string())
    }

    /// Nearest past decisions to a query.
    #[tool(description = "Find past decisions in short-term memory most similar to a URL, password weakness, or text label. Falls back to exact matches when similarity keys are unavailable.")]
    async fn similar_events(&self, Parameters(params): Parameters<SimilarEventsParams>) -> Result<String, String> {
        let kind: InputKind = params.r#type.parse().map_err(|e: vigil::error::DecisionError| e.to_string())?;
        let k = params.k.unwrap_or(DEFAULT_K);
        tracing::info!(kind = %kind, k, "similar_events called");
        Ok(similar_view(self.agent.memory(), kind, &params.query, k).to_string())
    }
}

#[tool_handler]
impl ServerHandler for VigilTools {
    fn get_info(&self) -> rmcp::model::ServerInfo {
        rmcp::model::ServerInfo {
            instructions: Some(
                "Vigil turns analyzer outputs into alert/log/ignore decisions and remembers them. \
                 Use decide to score an input, recent_events and similar_events to look back, \
                 and memory_stats for long-term trends."
                    .into(),
            ),
            capabilities: rmcp::model::ServerCapabilities::builder()
                .enable_tools()
                .build(),
            ..Default::default()
        }
    }
}

// ── JSON views shared with the HTTP surface ──────────────────────────────────

pub fn event_view(event: &MemoryEvent) -> Value {
    json!({
        "id": event.id,
        "seq": event.seq,
        "signal": event.signal,
        "decision": event.record.to_payload(),
    })
}

pub fn recent_view(memory: &MemoryStore, limit: usize) -> Value {
    let events: Vec<Value> = memory.recent_events(limit).iter().map(event_view).collect();
    json!({ "events": events, "total": events.len() })
}

pub fn stats_view(memory: &MemoryStore, top: usize) -> Value {
    let stats = memory.stats();
    json!({
        "total_events": stats.total_events,
        "running_mean_score": stats.running_mean_score,
        "action_counts": stats.action_counts,
        "short_term": { "len": memory.len(), "capacity": memory.capacity() },
        "top_malicious_urls": pairs(stats.top_malicious_urls(top)),
        "top_password_weaknesses": pairs(stats.top_password_weaknesses(top)),
    })
}

pub fn similar_view(memory: &MemoryStore, kind: InputKind, query: &str, k: usize) -> Value {
    let k = k.min(memory.capacity());
    let query = memory.query_for_text(kind, query);
    let matches: Vec<Value> = memory.similar(&query, k).iter().map(match_view).collect();
    json!({
        "signal": query.signal,
        "vector_search": query.key.is_some(),
        "matches": matches,
    })
}

fn match_view(m: &SimilarMatch) -> Value {
    let mut view = event_view(&m.event);
    view["distance"] = json!(m.distance);
    view
}

fn pairs(entries: Vec<(String, u64)>) -> Vec<Value> {
    entries
        .into_iter()
        .map(|(key, count)| json!({ "key": key, "count": count }))
        .collect()
}
