use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::handlers;
use crate::config::AppConfig;
use crate::error::Result;
use crate::llm::{LlmClient, OpenRouterClient};
use crate::platform::github::GitHubPlatform;
use crate::platform::Platform;
use crate::review::{AgentRegistry, Orchestrator};
use crate::service::ReviewService;

pub struct AppState {
    pub service: ReviewService,
}

impl AppState {
    /// Wire the production collaborators from configuration.
    pub fn new(config: &AppConfig) -> Result<Self> {
        let llm: Arc<dyn LlmClient> = Arc::new(OpenRouterClient::new(&config.llm)?);
        let platform: Arc<dyn Platform> = Arc::new(GitHubPlatform::new(&config.github)?);
        Ok(Self::from_parts(config, llm, platform))
    }

    /// Same wiring with caller-supplied collaborators.
    pub fn from_parts(config: &AppConfig, llm: Arc<dyn LlmClient>, platform: Arc<dyn Platform>) -> Self {
        let registry = AgentRegistry::from_config(config, llm);
        Self::with_registry(config, registry, platform)
    }

    pub fn with_registry(config: &AppConfig, registry: AgentRegistry, platform: Arc<dyn Platform>) -> Self {
        let orchestrator = Orchestrator::new(
            registry,
            Duration::from_secs(config.review.request_timeout_secs),
        );
        let service = ReviewService::new(platform, orchestrator, config.review.context_lines);
        Self { service }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/api/agents", get(handlers::list_agents))
        .route("/api/review", post(handlers::review_pr))
        .route("/api/review/diff", post(handlers::review_diff))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
