use sqlx::PgPool;

use crate::db::models::Question;

pub(crate) const COLUMNS: &str = "\
    q.id, q.content, q.question_type, q.options, q.correct_answer, q.points, \
    q.created_at, q.updated_at";

/// Questions attached to an exam, in exam order.
pub(crate) async fn list_by_exam(
    pool: &PgPool,
    exam_id: &str,
) -> Result<Vec<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "SELECT {COLUMNS}
         FROM questions q
         JOIN exam_questions eq ON eq.question_id = q.id
         WHERE eq.exam_id = $1
         ORDER BY eq.order_index, q.id"
    ))
    .bind(exam_id)
    .fetch_all(pool)
    .await
}
