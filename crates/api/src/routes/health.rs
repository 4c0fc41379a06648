//! Health Routes

use axum::{extract::State, Json};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use crate::AppState;

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: u64,
    pub version: String,
    pub uptime_seconds: u64,
    pub model_version: String,
    pub pattern_rules: usize,
    pub llm_provider: String,
    pub llm_model: String,
    pub decisions: u64,
}

/// Health check handler
pub async fn health_handler(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let timestamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    let workflow = &state.workflow;
    let model = workflow.explainer().model();

    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp,
        version: state.version.clone(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        model_version: workflow.scorer().metadata().model_version.clone(),
        pattern_rules: workflow.matcher().table().len(),
        llm_provider: model.name().to_string(),
        llm_model: model.model().to_string(),
        decisions: state.decisions.load(Ordering::Relaxed),
    })
}
