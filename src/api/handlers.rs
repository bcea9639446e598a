use std::collections::BTreeMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::Json;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::api::models::{ReviewDiffRequest, ReviewPrRequest};
use crate::error::{AppError, Result};
use crate::server::AppState;
use crate::service::{DiffReview, PullRequestReview, ReviewResponse};

pub async fn health(State(state): State<Arc<AppState>>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": "pr-council",
        "version": env!("CARGO_PKG_VERSION"),
        "agents": state.service.orchestrator().agent_names(),
    }))
}

pub async fn list_agents(State(state): State<Arc<AppState>>) -> Json<Value> {
    let orchestrator = state.service.orchestrator();
    let descriptions: BTreeMap<String, String> = orchestrator.descriptions().into_iter().collect();

    Json(json!({
        "agents": orchestrator.agent_names(),
        "descriptions": descriptions,
    }))
}

pub async fn review_pr(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<ReviewResponse>> {
    let request: ReviewPrRequest = parse_body(&body)?;
    let review = PullRequestReview::try_from(request)?;
    let response = state.service.review_pull_request(review).await?;
    Ok(Json(response))
}

pub async fn review_diff(State(state): State<Arc<AppState>>, body: Bytes) -> Result<Json<ReviewResponse>> {
    let request: ReviewDiffRequest = parse_body(&body)?;
    let response = state.service.review_diff(DiffReview::from(request)).await?;
    Ok(Json(response))
}

/// Malformed bodies are the caller's fault and surface as 400s.
fn parse_body<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    serde_json::from_slice(body).map_err(|e| AppError::InvalidRequest(format!("Invalid request body: {e}")))
}
