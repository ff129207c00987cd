use sqlx::PgPool;

use crate::db::models::ExamSession;
use crate::db::types::SessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, exam_id, applicant_id, status, started_at, completed_at, created_at";

pub(crate) async fn list_completed_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<ExamSession>, sqlx::Error> {
    sqlx::query_as::<_, ExamSession>(&format!(
        "SELECT {COLUMNS} FROM exam_sessions
         WHERE exam_id = $1 AND status = $2
         ORDER BY created_at, id"
    ))
    .bind(exam_id)
    .bind(SessionStatus::Completed)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_exam(pool: &PgPool, exam_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_sessions WHERE exam_id = $1")
        .bind(exam_id)
        .fetch_one(pool)
        .await
}

pub(crate) async fn count_by_exam_and_status(
    pool: &PgPool,
    exam_id: &str,
    status: SessionStatus,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM exam_sessions WHERE exam_id = $1 AND status = $2")
        .bind(exam_id)
        .bind(status)
        .fetch_one(pool)
        .await
}
