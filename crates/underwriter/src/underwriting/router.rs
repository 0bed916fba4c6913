use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use tracing::error;

use super::domain::Decision;
use super::orchestrator::DecisionOrchestrator;

pub const DEFAULT_CLIENT_ID: &str = "default";

/// Router exposing the decision endpoint and its health probe.
pub fn decision_router(orchestrator: Arc<DecisionOrchestrator>) -> Router {
    Router::new()
        .route("/decide/health", get(health_handler))
        .route("/decide/:domain/:product", post(decide_handler))
        .with_state(orchestrator)
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecideQuery {
    #[serde(rename = "clientId", default = "default_client_id")]
    pub(crate) client_id: String,
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_string()
}

/// Always answers 200 with a decision; failures surface as manual review. Configuration
/// reads block, so the decision runs on the blocking pool.
pub(crate) async fn decide_handler(
    State(orchestrator): State<Arc<DecisionOrchestrator>>,
    Path((domain, product)): Path<(String, String)>,
    Query(query): Query<DecideQuery>,
    body: Bytes,
) -> Response {
    let decision = tokio::task::spawn_blocking(move || {
        orchestrator.decide_bytes(&domain, &product, &query.client_id, &body)
    })
    .await
    .unwrap_or_else(|err| {
        error!(error = %err, "decision task did not complete");
        Decision::fail_safe(format!("decision task failed: {err}"))
    });
    (StatusCode::OK, axum::Json(decision)).into_response()
}

pub(crate) async fn health_handler() -> &'static str {
    "OK"
}
