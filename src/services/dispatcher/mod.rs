//! Runs task batches on an external worker set through the file protocol.
//!
//! [`JobDispatcher::dispatch`] never fails: every problem is folded into the returned
//! [`JobResult`] as either `error` (the worker set never started) or `failed` (it ran but
//! produced nothing usable).

pub(crate) mod process;
pub(crate) mod protocol;
pub(crate) mod simulator;

use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use serde::{Serialize, Serializer};
use thiserror::Error;
use time::OffsetDateTime;
use tracing::Instrument;
use uuid::Uuid;

use crate::core::config::{EvaluationSettings, WorkerCommand};
use crate::core::time::now_utc;
use crate::services::task_builder::TaskBatch;

use self::protocol::{InputDocument, OutputDocument, ProtocolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum JobStatus {
    Completed,
    Failed,
    Error,
}

impl JobStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Error => "error",
        }
    }
}

/// The worker set could not be started.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum DispatchError {
    #[error("failed to prepare work directory {}: {reason}", .path.display())]
    WorkDir { path: PathBuf, reason: String },
    #[error("failed to write job input: {0}")]
    Input(String),
    #[error("failed to start worker `{program}`: {reason}")]
    Spawn { program: String, reason: String },
}

/// The worker set ran but did not leave usable results behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum ExecutionFailure {
    #[error("worker set did not finish within {}s", .timeout.as_secs_f64())]
    TimedOut { timeout: Duration },
    #[error("worker set exited with code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },
    #[error("failed to wait for worker set: {0}")]
    Wait(String),
    #[error("worker set wrote no output file")]
    MissingOutput,
    #[error("worker output is unreadable: {0}")]
    MalformedOutput(String),
    #[error("simulated worker set failed: {0}")]
    Simulation(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub(crate) enum JobFailure {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),
    #[error(transparent)]
    Execution(#[from] ExecutionFailure),
}

impl JobFailure {
    pub(crate) fn status(&self) -> JobStatus {
        match self {
            JobFailure::Dispatch(_) => JobStatus::Error,
            JobFailure::Execution(_) => JobStatus::Failed,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct JobConfig {
    pub(crate) worker_count: u32,
    pub(crate) input_path: PathBuf,
    pub(crate) output_path: PathBuf,
    #[serde(rename = "timeout_seconds", serialize_with = "serialize_seconds")]
    pub(crate) timeout: Duration,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct JobResult {
    pub(crate) job_id: Uuid,
    pub(crate) config: JobConfig,
    pub(crate) status: JobStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) start_time: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub(crate) end_time: OffsetDateTime,
    pub(crate) execution_time: f64,
    pub(crate) output: Option<OutputDocument>,
    pub(crate) error_message: Option<String>,
    #[serde(skip)]
    pub(crate) failure: Option<JobFailure>,
}

impl JobResult {
    pub(crate) fn is_completed(&self) -> bool {
        self.status == JobStatus::Completed
    }
}

#[derive(Debug, Clone)]
pub(crate) struct DispatcherConfig {
    pub(crate) worker: WorkerCommand,
    pub(crate) work_dir: PathBuf,
    pub(crate) timeout: Duration,
    pub(crate) simulated_task_delay: Duration,
}

impl DispatcherConfig {
    pub(crate) fn from_settings(settings: &EvaluationSettings) -> Self {
        Self {
            worker: settings.worker_command(),
            work_dir: settings.work_dir.clone(),
            timeout: settings.timeout(),
            simulated_task_delay: settings.simulated_task_delay(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct JobDispatcher {
    config: DispatcherConfig,
}

impl JobDispatcher {
    pub(crate) fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    pub(crate) async fn dispatch(&self, batch: &TaskBatch, worker_count: u32) -> JobResult {
        let job_id = Uuid::new_v4();
        let config = JobConfig {
            worker_count,
            input_path: self.config.work_dir.join(format!("input_{job_id}.json")),
            output_path: self.config.work_dir.join(format!("output_{job_id}.json")),
            timeout: self.config.timeout,
        };
        let span =
            tracing::info_span!("evaluation_job", %job_id, worker_count, tasks = batch.len());

        async move {
            let start_time = now_utc();
            let timer = Instant::now();
            metrics::counter!("evaluation_tasks_total").increment(batch.len() as u64);

            let outcome = self.execute(&config, batch).await;
            cleanup(&config).await;

            let execution_time = timer.elapsed().as_secs_f64();
            let end_time = now_utc();

            let (status, output, failure) = match outcome {
                Ok(output) => (JobStatus::Completed, Some(output), None),
                Err(failure) => (failure.status(), None, Some(failure)),
            };

            metrics::counter!("evaluation_jobs_total", "status" => status.as_str()).increment(1);
            metrics::histogram!("evaluation_job_duration_seconds").record(execution_time);

            match &failure {
                None => tracing::info!(
                    status = status.as_str(),
                    execution_time,
                    "Evaluation job completed"
                ),
                Some(err) => tracing::error!(
                    status = status.as_str(),
                    execution_time,
                    error = %err,
                    "Evaluation job did not complete"
                ),
            }

            JobResult {
                job_id,
                config,
                status,
                start_time,
                end_time,
                execution_time,
                output,
                error_message: failure.as_ref().map(ToString::to_string),
                failure,
            }
        }
        .instrument(span)
        .await
    }

    async fn execute(
        &self,
        config: &JobConfig,
        batch: &TaskBatch,
    ) -> Result<OutputDocument, JobFailure> {
        tokio::fs::create_dir_all(&self.config.work_dir).await.map_err(|err| {
            DispatchError::WorkDir { path: self.config.work_dir.clone(), reason: err.to_string() }
        })?;

        protocol::write_input(&config.input_path, &InputDocument::from_batch(batch))
            .await
            .map_err(|err| DispatchError::Input(err.to_string()))?;

        let input = path_arg(&config.input_path);
        let output = path_arg(&config.output_path);
        let workers = config.worker_count.to_string();

        match &self.config.worker {
            WorkerCommand::Simulator { program, args } => {
                let mut argv = args.clone();
                argv.extend([input, output, workers]);
                process::run(program, &argv, config.timeout).await?;
            }
            WorkerCommand::Native { launcher, launcher_args, binary } => {
                if binary_exists(binary).await {
                    let mut argv = launcher_args.clone();
                    argv.extend(["-n".to_string(), workers, path_arg(binary), input, output]);
                    process::run(launcher, &argv, config.timeout).await?;
                } else {
                    tracing::warn!(
                        binary = %binary.display(),
                        "Native worker binary not found; using in-process simulator"
                    );
                    self.simulate(config).await?;
                }
            }
        }

        protocol::read_output(&config.output_path).await.map_err(|err| match err {
            ProtocolError::Missing(_) => ExecutionFailure::MissingOutput.into(),
            other => ExecutionFailure::MalformedOutput(other.to_string()).into(),
        })
    }

    /// The emulated delay is capped at half the timeout so large batches still complete.
    async fn simulate(&self, config: &JobConfig) -> Result<(), JobFailure> {
        let run = simulator::simulate(
            &config.input_path,
            &config.output_path,
            config.worker_count,
            self.config.simulated_task_delay,
            config.timeout / 2,
        );

        match tokio::time::timeout(config.timeout, run).await {
            Ok(Ok(_)) => Ok(()),
            Ok(Err(err)) => Err(ExecutionFailure::Simulation(err.to_string()).into()),
            Err(_) => Err(ExecutionFailure::TimedOut { timeout: config.timeout }.into()),
        }
    }
}

async fn binary_exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}

async fn cleanup(config: &JobConfig) {
    for path in [&config.input_path, &config.output_path] {
        match tokio::fs::remove_file(path).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "Failed to remove job file");
            }
        }
    }
}

fn path_arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

fn serialize_seconds<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(value.as_secs())
}
