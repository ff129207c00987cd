use axum::extract::State;
use axum::{routing::get, Json, Router};

use crate::core::state::AppState;
use crate::db::types::QuestionType;
use crate::schemas::{SupportedOperations, SystemInfoResponse};

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/info", get(system_info))
}

/// Worker configuration and evaluation limits as currently loaded.
async fn system_info(State(state): State<AppState>) -> Json<SystemInfoResponse> {
    let settings = state.settings();
    let evaluation = settings.evaluation();

    Json(SystemInfoResponse {
        app_name: settings.api().project_name.clone(),
        environment: settings.runtime().environment.as_str(),
        worker_path: evaluation.worker_path.clone(),
        worker_mode: evaluation.worker_command().kind(),
        supported_operations: SupportedOperations {
            max_parallel_processes: state.orchestrator().max_workers(),
            default_parallel_processes: evaluation.default_workers,
            timeout_seconds: evaluation.timeout_seconds,
            supported_question_types: QuestionType::ALL.iter().map(|kind| kind.as_str()).collect(),
        },
    })
}
