use std::sync::Arc;

use thiserror::Error;

use crate::core::config::{EvaluationSettings, MAX_WORKER_COUNT};
use crate::repositories::EvaluationStore;
use crate::services::aggregation::{ExamTotals, ResultAggregator};
use crate::services::dispatcher::{DispatcherConfig, JobDispatcher, JobResult};
use crate::services::task_builder::{self, TaskBatch};

/// Request problems detected before anything is dispatched.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ValidationError {
    #[error("worker count must be between 1 and {max}, got {requested}")]
    WorkerCountOutOfRange { requested: u32, max: u32 },
    #[error("exam {exam_id} has no completed sessions to evaluate")]
    NoCompletedSessions { exam_id: String },
}

#[derive(Debug, Error)]
pub(crate) enum EvaluationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("exam {0} not found")]
    ExamNotFound(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

/// Runs one exam through task building, dispatch, aggregation and writeback.
pub(crate) struct EvaluationOrchestrator {
    store: Arc<dyn EvaluationStore>,
    dispatcher: JobDispatcher,
    max_workers: u32,
}

impl EvaluationOrchestrator {
    pub(crate) fn new(
        store: Arc<dyn EvaluationStore>,
        dispatcher: JobDispatcher,
        max_workers: u32,
    ) -> Self {
        Self { store, dispatcher, max_workers: max_workers.clamp(1, MAX_WORKER_COUNT) }
    }

    pub(crate) fn from_settings(
        store: Arc<dyn EvaluationStore>,
        settings: &EvaluationSettings,
    ) -> Self {
        let dispatcher = JobDispatcher::new(DispatcherConfig::from_settings(settings));
        Self::new(store, dispatcher, settings.max_workers)
    }

    pub(crate) fn max_workers(&self) -> u32 {
        self.max_workers
    }

    /// Grades every completed session of `exam_id` on `worker_count` workers.
    ///
    /// Only request validation and store reads fail the call. Once a job has been
    /// dispatched its [`JobResult`] is returned even if aggregation or writeback fails.
    #[tracing::instrument(skip(self), fields(status = tracing::field::Empty))]
    pub(crate) async fn evaluate(
        &self,
        exam_id: &str,
        worker_count: u32,
    ) -> Result<JobResult, EvaluationError> {
        if worker_count == 0 || worker_count > self.max_workers {
            return Err(ValidationError::WorkerCountOutOfRange {
                requested: worker_count,
                max: self.max_workers,
            }
            .into());
        }

        let exam = self
            .store
            .fetch_exam(exam_id)
            .await?
            .ok_or_else(|| EvaluationError::ExamNotFound(exam_id.to_string()))?;

        let sessions = self.store.fetch_completed_sessions(exam_id).await?;
        if sessions.is_empty() {
            return Err(
                ValidationError::NoCompletedSessions { exam_id: exam_id.to_string() }.into()
            );
        }

        let session_ids: Vec<String> = sessions.into_iter().map(|session| session.id).collect();
        let responses = self.store.fetch_responses(&session_ids).await?;
        let questions = self.store.fetch_questions(exam_id).await?;
        let batch = task_builder::build(&responses, &questions);

        tracing::info!(
            sessions = session_ids.len(),
            tasks = batch.len(),
            points = batch.total_points(),
            "Dispatching evaluation job"
        );

        let result = self.dispatcher.dispatch(&batch, worker_count).await;
        tracing::Span::current().record("status", result.status.as_str());

        if result.is_completed() {
            self.write_back(&result, &batch, ExamTotals::from(&exam)).await;
        }

        Ok(result)
    }

    async fn write_back(&self, result: &JobResult, batch: &TaskBatch, exam: ExamTotals) {
        let Some(output) = result.output.as_ref() else {
            return;
        };

        let aggregate =
            match ResultAggregator::new(&batch.tasks).aggregate(&output.evaluation_results) {
                Ok(aggregate) => aggregate,
                Err(err) => {
                    metrics::counter!("evaluation_aggregation_failures_total").increment(1);
                    tracing::error!(
                        job_id = %result.job_id,
                        error = %err,
                        "Failed to aggregate results"
                    );
                    return;
                }
            };

        let summaries: Vec<_> =
            aggregate.sessions.iter().map(|score| score.summarize(exam)).collect();

        match self.store.persist_evaluation(&aggregate.records, &summaries).await {
            Ok(()) => tracing::info!(
                job_id = %result.job_id,
                grades = aggregate.records.len(),
                sessions = summaries.len(),
                "Stored evaluation results"
            ),
            Err(err) => {
                metrics::counter!("evaluation_aggregation_failures_total").increment(1);
                tracing::error!(
                    job_id = %result.job_id,
                    error = ?err,
                    "Failed to store evaluation results"
                );
            }
        }
    }
}
