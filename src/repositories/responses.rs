use sqlx::{PgConnection, PgPool};

use crate::db::models::ApplicantResponse;
use crate::services::aggregation::GradeRecord;

pub(crate) const COLUMNS: &str = "\
    id, session_id, question_id, answer, is_correct, points_earned, submitted_at";

pub(crate) async fn list_by_sessions(
    pool: &PgPool,
    session_ids: &[String],
) -> Result<Vec<ApplicantResponse>, sqlx::Error> {
    if session_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ApplicantResponse>(&format!(
        "SELECT {COLUMNS}
         FROM responses
         WHERE session_id = ANY($1)
         ORDER BY session_id, submitted_at, id"
    ))
    .bind(session_ids)
    .fetch_all(pool)
    .await
}

/// Stores the grade on each response. Returns the number of rows touched.
pub(crate) async fn write_grades(
    conn: &mut PgConnection,
    grades: &[GradeRecord],
) -> Result<u64, sqlx::Error> {
    let mut updated = 0;

    for grade in grades {
        let result = sqlx::query(
            "UPDATE responses
             SET is_correct = $2,
                 points_earned = $3
             WHERE id = $1",
        )
        .bind(&grade.response_id)
        .bind(grade.is_correct)
        .bind(i32::try_from(grade.points_earned).unwrap_or(i32::MAX))
        .execute(&mut *conn)
        .await?;
        updated += result.rows_affected();
    }

    Ok(updated)
}
