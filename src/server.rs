//! Server initialization for the MCP stdio and HTTP JSON transports.
//!
//! Both entry points share one lifecycle: load (or create) the memory
//! snapshot, start the background flusher, serve until the client goes away or
//! ctrl-c arrives, then stop the flusher so the final state reaches disk.

use anyhow::{Context, Result};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use rmcp::ServiceExt;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::tools::{self, VigilTools};
use vigil::analysis::InputKind;
use vigil::config::VigilConfig;
use vigil::decision::agent::DecisionAgent;
use vigil::decision::reasoning::ReasoningComposer;
use vigil::decision::record::DecisionPayload;
use vigil::error::DecisionError;
use vigil::memory::store::{MemoryStore, SimilarityIndex};
use vigil::persist::flusher::{self, FlushHandle, FlushPolicy};
use vigil::persist::PersistenceManager;
use vigil::responders::ResponderSet;

/// What every request handler needs.
#[derive(Clone)]
pub struct AppState {
    agent: DecisionAgent,
    responders: ResponderSet,
}

impl AppState {
    pub fn new(agent: DecisionAgent, responders: ResponderSet) -> Self {
        Self { agent, responders }
    }
}

/// Shared setup: load memory, start the flusher, build the agent and responders.
fn setup_shared_state(config: &VigilConfig) -> Result<(AppState, FlushHandle)> {
    let persistence = PersistenceManager::new(config.resolved_memory_path());
    let similarity =
        SimilarityIndex::from_config(&config.similarity).context("failed to set up similarity search")?;
    let memory = Arc::new(MemoryStore::init(
        &persistence,
        config.memory.short_term_capacity,
        similarity,
    ));
    tracing::info!(
        path = %persistence.path().display(),
        events = memory.len(),
        total = memory.stats().total_events,
        "memory ready"
    );

    let flusher = flusher::spawn(
        Arc::clone(&memory),
        persistence,
        FlushPolicy::from_config(&config.memory),
    );

    let reasoning = ReasoningComposer::from_config(&config.reasoning)?;
    let responders = ResponderSet::from_config(&config.responders)?;
    let agent = DecisionAgent::new(memory, reasoning);

    Ok((AppState::new(agent, responders), flusher))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: VigilConfig) -> Result<()> {
    tracing::info!("starting Vigil MCP server on stdio");

    let (state, flusher) = setup_shared_state(&config)?;

    let result = async {
        let server = VigilTools::new(state.agent, state.responders).serve(rmcp::transport::stdio()).await?;
        tracing::info!("MCP server running, waiting for client");
        server.waiting().await?;
        anyhow::Ok(())
    }
    .await;

    flusher.shutdown().await;
    tracing::info!("MCP server shut down");
    result
}

/// Start the HTTP JSON API.
pub async fn serve_http(config: VigilConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!(addr = %bind_addr, "starting Vigil HTTP server");

    let (state, flusher) = setup_shared_state(&config)?;

    let result = async {
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;
        tracing::info!(addr = %bind_addr, "HTTP server listening at http://{bind_addr}/");

        axum::serve(listener, router(state))
            .with_graceful_shutdown(async {
                if let Err(e) = tokio::signal::ctrl_c().await {
                    tracing::warn!(error = %e, "failed to listen for ctrl-c");
                }
                tracing::info!("shutting down HTTP server");
            })
            .await?;
        anyhow::Ok(())
    }
    .await;

    flusher.shutdown().await;
    result
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health))
        .route("/agent/route", post(route_decision))
        .route("/memory/recent", get(recent))
        .route("/memory/stats", get(stats))
        .route("/memory/similar", post(similar))
        .with_state(state)
}

struct ApiError(DecisionError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let code = match self.0 {
            DecisionError::InvalidKind(_) => "unknown_type",
            DecisionError::MalformedRequest(_) => "malformed_request",
        };
        tracing::info!(error = %self.0, "request rejected");
        (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": code, "detail": self.0.to_string() })),
        )
            .into_response()
    }
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok", "service": "vigil" }))
}

async fn route_decision(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<Json<DecisionPayload>, ApiError> {
    let record = state.agent.route(&body).await.map_err(ApiError)?;
    state.responders.dispatch(&record);
    Ok(Json(record.to_payload()))
}

#[derive(Deserialize)]
struct RecentQuery {
    limit: Option<usize>,
}

async fn recent(State(state): State<AppState>, Query(q): Query<RecentQuery>) -> Json<Value> {
    Json(tools::recent_view(state.agent.memory(), q.limit.unwrap_or(10)))
}

#[derive(Deserialize)]
struct StatsQuery {
    top: Option<usize>,
}

async fn stats(State(state): State<AppState>, Query(q): Query<StatsQuery>) -> Json<Value> {
    Json(tools::stats_view(state.agent.memory(), q.top.unwrap_or(5)))
}

#[derive(Deserialize)]
struct SimilarRequest {
    r#type: String,
    query: String,
    k: Option<usize>,
}

async fn similar(
    State(state): State<AppState>,
    Json(req): Json<SimilarRequest>,
) -> Result<Json<Value>, ApiError> {
    let kind: InputKind = req.r#type.parse().map_err(ApiError)?;
    Ok(Json(tools::similar_view(state.agent.memory(), kind, &req.query, req.k.unwrap_or(5))))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn spawn_app() -> String {
        let memory = Arc::new(MemoryStore::new(30, SimilarityIndex::disabled()));
        let state = AppState::new(
            DecisionAgent::new(memory, ReasoningComposer::template_only()),
            ResponderSet::default(),
        );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        format!("http://{addr}")
    }

    #[tokio::test]
    async fn route_and_read_back_over_http() {
        let base = spawn_app().await;
        let client = reqwest::Client::new();

        let health: Value = client.get(format!("{base}/")).send().await.unwrap().json().await.unwrap();
        assert_eq!(health["status"], "ok");

        let resp = client
            .post(format!("{base}/agent/route"))
            .json(&json!({"type": "password", "analyzer": {"risk_score": 100, "strength": "very_weak"}}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let payload: Value = resp.json().await.unwrap();
        assert_eq!(payload["action"], "alert");

        let recent: Value = client
            .get(format!("{base}/memory/recent?limit=5"))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(recent["total"], 1);

        let stats: Value = client.get(format!("{base}/memory/stats")).send().await.unwrap().json().await.unwrap();
        assert_eq!(stats["top_password_weaknesses"][0]["key"], "very_weak");

        let similar: Value = client
            .post(format!("{base}/memory/similar"))
            .json(&json!({"type": "password", "query": "very_weak"}))
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(similar["matches"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn unknown_type_is_a_400() {
        let base = spawn_app().await;
        let resp = reqwest::Client::new()
            .post(format!("{base}/agent/route"))
            .json(&json!({"type": "email", "analyzer": {"risk_score": 50}}))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 400);
        let body: Value = resp.json().await.unwrap();
        assert_eq!(body["error"], "unknown_type");
    }
}
