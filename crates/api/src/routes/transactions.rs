//! Transaction Routes

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use transaction::Transaction;
use workflow::{run_batch, BatchSummary, DecisionRecord};

use crate::{ApiError, AppState};

/// Request body for the batch endpoint
#[derive(Debug, Deserialize)]
pub struct BatchRequest {
    pub transactions: Vec<Transaction>,
}

/// Response for the batch endpoint
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub summary: BatchSummary,
    pub records: Vec<DecisionRecord>,
}

/// Decide one transaction
pub async fn score_handler(
    State(state): State<Arc<AppState>>,
    Json(transaction): Json<Transaction>,
) -> Result<Json<DecisionRecord>, ApiError> {
    metrics::counter!("fraud_api_requests_total", "route" => "score").increment(1);

    let workflow = state.workflow.clone();
    let record = tokio::task::spawn_blocking(move || workflow.run(transaction))
        .await
        .map_err(|e| ApiError::Internal(format!("Decision task failed: {}", e)))?;

    state.decisions.fetch_add(1, Ordering::Relaxed);
    Ok(Json(record))
}

/// Decide a batch of transactions
pub async fn batch_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<BatchRequest>,
) -> Result<Json<BatchResponse>, ApiError> {
    metrics::counter!("fraud_api_requests_total", "route" => "batch").increment(1);

    let count = request.transactions.len();
    if count == 0 {
        return Err(ApiError::BadRequest("Batch contains no transactions".to_string()));
    }
    if count > state.max_batch_size {
        return Err(ApiError::BadRequest(format!(
            "Batch of {} exceeds the limit of {} transactions",
            count, state.max_batch_size
        )));
    }

    let records = run_batch(state.workflow.clone(), request.transactions, state.batch_workers).await;
    let summary = BatchSummary::from_records(&records);
    state.decisions.fetch_add(count as u64, Ordering::Relaxed);

    info!(
        total = summary.total,
        flagged = summary.flagged,
        failed = summary.failed,
        "Batch request decided"
    );
    Ok(Json(BatchResponse { summary, records }))
}
