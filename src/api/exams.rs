use axum::extract::{Path, State};
use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::core::state::AppState;
use crate::services::reports::{self, ExamStats};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/:exam_id/stats", get(exam_stats))
}

async fn exam_stats(
    State(state): State<AppState>,
    Path(exam_id): Path<String>,
) -> Result<Json<ExamStats>, ApiError> {
    reports::exam_stats(state.db(), &exam_id)
        .await
        .map_err(|err| ApiError::internal(format!("{err:#}"), "Failed to load exam statistics"))?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Exam {exam_id} not found")))
}
