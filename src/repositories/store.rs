use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::PgPool;

use crate::core::time::primitive_now_utc;
use crate::db::models::{ApplicantResponse, Exam, ExamSession, Question};
use crate::repositories;
use crate::services::aggregation::{EvaluationSummary, GradeRecord};

/// Persistence used by the evaluation pipeline.
#[async_trait]
pub(crate) trait EvaluationStore: Send + Sync {
    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>>;

    async fn fetch_completed_sessions(&self, exam_id: &str) -> Result<Vec<ExamSession>>;

    async fn fetch_responses(&self, session_ids: &[String]) -> Result<Vec<ApplicantResponse>>;

    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>>;

    /// Writes grades and session summaries together; either all land or none do.
    async fn persist_evaluation(
        &self,
        grades: &[GradeRecord],
        summaries: &[EvaluationSummary],
    ) -> Result<()>;
}

#[derive(Clone)]
pub(crate) struct PgEvaluationStore {
    pool: PgPool,
}

impl PgEvaluationStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationStore for PgEvaluationStore {
    async fn fetch_exam(&self, exam_id: &str) -> Result<Option<Exam>> {
        repositories::exams::find_by_id(&self.pool, exam_id).await.context("Failed to fetch exam")
    }

    async fn fetch_completed_sessions(&self, exam_id: &str) -> Result<Vec<ExamSession>> {
        repositories::sessions::list_completed_by_exam(&self.pool, exam_id)
            .await
            .context("Failed to fetch completed sessions")
    }

    async fn fetch_responses(&self, session_ids: &[String]) -> Result<Vec<ApplicantResponse>> {
        repositories::responses::list_by_sessions(&self.pool, session_ids)
            .await
            .context("Failed to fetch responses")
    }

    async fn fetch_questions(&self, exam_id: &str) -> Result<Vec<Question>> {
        repositories::questions::list_by_exam(&self.pool, exam_id)
            .await
            .context("Failed to fetch exam questions")
    }

    async fn persist_evaluation(
        &self,
        grades: &[GradeRecord],
        summaries: &[EvaluationSummary],
    ) -> Result<()> {
        let now = primitive_now_utc();
        let mut tx = self.pool.begin().await.context("Failed to start evaluation transaction")?;

        let updated = repositories::responses::write_grades(&mut tx, grades)
            .await
            .context("Failed to store response grades")?;
        if updated != grades.len() as u64 {
            tracing::warn!(
                expected = grades.len(),
                updated,
                "Some graded responses no longer exist"
            );
        }

        for summary in summaries {
            repositories::evaluations::write_summary(&mut tx, summary, now)
                .await
                .with_context(|| format!("Failed to store evaluation for {}", summary.session_id))?;
        }

        tx.commit().await.context("Failed to commit evaluation transaction")?;
        Ok(())
    }
}
