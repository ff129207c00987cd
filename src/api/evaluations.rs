use axum::extract::State;
use axum::{routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::schemas::evaluation::EvaluateExamRequest;
use crate::services::dispatcher::JobResult;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/evaluate-exam", post(evaluate_exam))
}

async fn evaluate_exam(
    State(state): State<AppState>,
    Json(payload): Json<EvaluateExamRequest>,
) -> Result<Json<JobResult>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let worker_count = payload
        .parallel_processes
        .unwrap_or(state.settings().evaluation().default_workers);

    tracing::info!(exam_id = %payload.exam_id, worker_count, "Evaluation requested");
    let result = state.orchestrator().evaluate(&payload.exam_id, worker_count).await?;

    Ok(Json(result))
}
