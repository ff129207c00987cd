use sqlx::{PgConnection, PgPool};
use time::PrimitiveDateTime;
use uuid::Uuid;

use crate::db::types::EvaluationStatus;
use crate::services::aggregation::EvaluationSummary;

pub(crate) async fn write_summary(
    conn: &mut PgConnection,
    summary: &EvaluationSummary,
    now: PrimitiveDateTime,
) -> Result<String, sqlx::Error> {
    let id = Uuid::new_v4().to_string();

    sqlx::query(
        "INSERT INTO evaluations (
            id, session_id, total_questions, correct_answers, total_points,
            score_percentage, status, evaluation_time, created_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$8)",
    )
    .bind(&id)
    .bind(&summary.session_id)
    .bind(i32::try_from(summary.total_questions).unwrap_or(i32::MAX))
    .bind(i32::try_from(summary.correct_answers).unwrap_or(i32::MAX))
    .bind(i32::try_from(summary.total_points).unwrap_or(i32::MAX))
    .bind(summary.score_percentage)
    .bind(EvaluationStatus::Completed)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Latest completed score for each evaluated session of an exam.
pub(crate) async fn latest_scores_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<f64>, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT DISTINCT ON (e.session_id) e.score_percentage
         FROM evaluations e
         JOIN exam_sessions s ON s.id = e.session_id
         WHERE s.exam_id = $1 AND e.status = $2
         ORDER BY e.session_id, e.created_at DESC",
    )
    .bind(exam_id)
    .bind(EvaluationStatus::Completed)
    .fetch_all(pool)
    .await
}
