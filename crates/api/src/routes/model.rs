//! Model Routes

use axum::{extract::State, Json};
use risk_scorer::{BorderlineBand, ModelInsights};
use serde::Serialize;
use std::sync::Arc;

use crate::AppState;

/// Response for the model endpoint
#[derive(Debug, Serialize)]
pub struct ModelResponse {
    #[serde(flatten)]
    pub insights: ModelInsights,
    /// Threshold in effect, after any configured default
    pub decision_threshold: f64,
    pub borderline: BorderlineBand,
}

/// Get model insights
pub async fn model_handler(State(state): State<Arc<AppState>>) -> Json<ModelResponse> {
    let scorer = state.workflow.scorer();
    Json(ModelResponse {
        insights: scorer.metadata().insights(),
        decision_threshold: scorer.threshold(),
        borderline: scorer.band(),
    })
}
