use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::evaluation::EvaluationError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    BadRequest(String),
    NotFound(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }
}

impl From<EvaluationError> for ApiError {
    fn from(err: EvaluationError) -> Self {
        match err {
            EvaluationError::Validation(err) => ApiError::BadRequest(err.to_string()),
            EvaluationError::ExamNotFound(exam_id) => {
                ApiError::NotFound(format!("Exam {exam_id} not found"))
            }
            EvaluationError::Store(err) => {
                ApiError::internal(format!("{err:#}"), "Evaluation failed")
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, detail) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, message),
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, message)
            }
        };

        (status, Json(ErrorResponse { status: status.as_u16(), detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::evaluation::ValidationError;

    #[test]
    fn evaluation_errors_map_to_http_statuses() {
        let validation: ApiError =
            EvaluationError::from(ValidationError::WorkerCountOutOfRange { requested: 0, max: 16 })
                .into();
        let missing: ApiError = EvaluationError::ExamNotFound("exam-1".to_string()).into();
        let store: ApiError = EvaluationError::Store(anyhow::anyhow!("connection reset")).into();

        assert_eq!(validation.into_response().status(), StatusCode::BAD_REQUEST);
        assert_eq!(missing.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(store.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
