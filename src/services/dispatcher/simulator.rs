//! In-process stand-in for a worker set, also used by the `grade-simulator` binary.

use std::path::Path;
use std::time::Duration;

use crate::core::time::timestamp_now;
use crate::services::grading_engine;

use super::protocol::{
    self, OutputDocument, OutputMetadata, ProtocolError, ResultEntry, TaskEntry,
};

/// Grades every task in `input_path` and writes the results to `output_path`.
///
/// Sleeps `per_task_delay × tasks / worker_count`, capped at `max_delay`, before writing to
/// mimic a parallel run. Returns the number of processed tasks.
pub(crate) async fn simulate(
    input_path: &Path,
    output_path: &Path,
    worker_count: u32,
    per_task_delay: Duration,
    max_delay: Duration,
) -> Result<usize, ProtocolError> {
    let input = protocol::read_input(input_path).await?;
    let results: Vec<ResultEntry> = input.evaluation_tasks.iter().map(grade_entry).collect();

    let delay = simulated_duration(per_task_delay, results.len(), worker_count).min(max_delay);
    tracing::info!(
        tasks = results.len(),
        worker_count,
        delay_ms = delay.as_millis() as u64,
        "Simulating worker set"
    );
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let processed = results.len();
    let document = OutputDocument {
        job_metadata: OutputMetadata {
            processed_tasks: Some(processed),
            simulation: Some(true),
            processes_used: Some(worker_count),
            completion_time: Some(timestamp_now()),
        },
        evaluation_results: results,
    };
    protocol::write_output(output_path, &document).await?;

    Ok(processed)
}

pub(crate) fn grade_entry(task: &TaskEntry) -> ResultEntry {
    let is_correct =
        grading_engine::grade(&task.applicant_answer, &task.correct_answer, task.question_type);

    ResultEntry {
        response_id: task.response_id.clone(),
        session_id: task.session_id.clone(),
        question_id: task.question_id.clone(),
        is_correct,
        points_earned: i64::from(grading_engine::points_earned(is_correct, task.points)),
        evaluation_time: timestamp_now(),
        processed_by_rank: None,
    }
}

fn simulated_duration(per_task_delay: Duration, tasks: usize, worker_count: u32) -> Duration {
    let tasks = u32::try_from(tasks).unwrap_or(u32::MAX);
    per_task_delay
        .checked_mul(tasks)
        .map(|total| total / worker_count.max(1))
        .unwrap_or(Duration::MAX)
}
