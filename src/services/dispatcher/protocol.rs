//! JSON documents exchanged with worker sets through the job's input and output files.
//!
//! The field names here are the contract external worker binaries rely on, so they
//! must not be renamed.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::time::timestamp_now;
use crate::db::types::QuestionType;
use crate::services::task_builder::{GradeTask, TaskBatch};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct InputDocument {
    pub(crate) job_metadata: InputMetadata,
    pub(crate) evaluation_tasks: Vec<TaskEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct InputMetadata {
    pub(crate) total_tasks: usize,
    pub(crate) total_responses: usize,
    pub(crate) total_questions: usize,
    pub(crate) timestamp: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TaskEntry {
    pub(crate) response_id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) applicant_answer: String,
    pub(crate) correct_answer: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: u32,
    #[serde(default)]
    pub(crate) options: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct OutputDocument {
    #[serde(default)]
    pub(crate) job_metadata: OutputMetadata,
    pub(crate) evaluation_results: Vec<ResultEntry>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub(crate) struct OutputMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) processed_tasks: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) simulation: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) processes_used: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) completion_time: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct ResultEntry {
    pub(crate) response_id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i64,
    pub(crate) evaluation_time: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) processed_by_rank: Option<u32>,
}

#[derive(Debug, Error)]
pub(crate) enum ProtocolError {
    #[error("file not found: {}", .0.display())]
    Missing(PathBuf),
    #[error("failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid JSON in {}: {source}", .path.display())]
    Json { path: PathBuf, source: serde_json::Error },
}

impl InputDocument {
    pub(crate) fn from_batch(batch: &TaskBatch) -> Self {
        Self {
            job_metadata: InputMetadata {
                total_tasks: batch.len(),
                total_responses: batch.total_responses,
                total_questions: batch.total_questions,
                timestamp: timestamp_now(),
            },
            evaluation_tasks: batch.tasks.iter().map(TaskEntry::from).collect(),
        }
    }
}

impl From<&GradeTask> for TaskEntry {
    fn from(task: &GradeTask) -> Self {
        Self {
            response_id: task.response_id.clone(),
            session_id: task.session_id.clone(),
            question_id: task.question_id.clone(),
            applicant_answer: task.applicant_answer.clone(),
            correct_answer: task.correct_answer.clone(),
            question_type: task.question_type,
            points: task.points,
            options: task.options.clone(),
        }
    }
}

impl From<TaskEntry> for GradeTask {
    fn from(entry: TaskEntry) -> Self {
        Self {
            response_id: entry.response_id,
            session_id: entry.session_id,
            question_id: entry.question_id,
            applicant_answer: entry.applicant_answer,
            correct_answer: entry.correct_answer,
            question_type: entry.question_type,
            points: entry.points,
            options: entry.options,
        }
    }
}

pub(crate) async fn write_input(
    path: &Path,
    document: &InputDocument,
) -> Result<(), ProtocolError> {
    write_json(path, document).await
}

pub(crate) async fn read_input(path: &Path) -> Result<InputDocument, ProtocolError> {
    read_json(path).await
}

pub(crate) async fn write_output(
    path: &Path,
    document: &OutputDocument,
) -> Result<(), ProtocolError> {
    write_json(path, document).await
}

pub(crate) async fn read_output(path: &Path) -> Result<OutputDocument, ProtocolError> {
    read_json(path).await
}

async fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ProtocolError> {
    let bytes = serde_json::to_vec_pretty(value)
        .map_err(|source| ProtocolError::Json { path: path.to_path_buf(), source })?;
    tokio::fs::write(path, bytes)
        .await
        .map_err(|source| ProtocolError::Io { path: path.to_path_buf(), source })
}

async fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, ProtocolError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return Err(ProtocolError::Missing(path.to_path_buf()));
        }
        Err(source) => return Err(ProtocolError::Io { path: path.to_path_buf(), source }),
    };

    serde_json::from_slice(&bytes)
        .map_err(|source| ProtocolError::Json { path: path.to_path_buf(), source })
}
