use std::process::Stdio;
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio::time::{timeout_at, Instant};

use super::{DispatchError, ExecutionFailure, JobFailure};

/// Longest stderr tail carried into a job's error message.
const STDERR_TAIL_CHARS: usize = 2000;

#[derive(Debug, Default)]
pub(crate) struct WorkerOutput {
    pub(crate) stdout: String,
    pub(crate) stderr: String,
}

/// Runs a worker set to completion. The child is killed once `limit` elapses.
///
/// Collecting stdout and stderr shares the same deadline, so a grandchild that keeps
/// the pipes open after the worker exits cannot stall the job.
pub(crate) async fn run(
    program: &str,
    args: &[String],
    limit: Duration,
) -> Result<WorkerOutput, JobFailure> {
    tracing::info!(program, ?args, "Launching worker set");

    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| DispatchError::Spawn {
            program: program.to_string(),
            reason: err.to_string(),
        })?;

    let deadline = Instant::now() + limit;
    let mut stdout = tokio::spawn(drain(child.stdout.take()));
    let mut stderr = tokio::spawn(drain(child.stderr.take()));

    let status = match timeout_at(deadline, child.wait()).await {
        Ok(Ok(status)) => status,
        Ok(Err(err)) => {
            stdout.abort();
            stderr.abort();
            return Err(ExecutionFailure::Wait(err.to_string()).into());
        }
        Err(_) => {
            if let Err(err) = child.kill().await {
                tracing::warn!(error = %err, "Failed to kill timed out worker set");
            }
            stdout.abort();
            stderr.abort();
            tracing::error!(timeout_seconds = limit.as_secs_f64(), "Worker set timed out");
            return Err(ExecutionFailure::TimedOut { timeout: limit }.into());
        }
    };

    let output = WorkerOutput {
        stdout: collect(&mut stdout, deadline, "stdout").await,
        stderr: collect(&mut stderr, deadline, "stderr").await,
    };

    if !output.stdout.is_empty() {
        tracing::debug!(stdout = %output.stdout.trim_end(), "Worker set stdout");
    }

    if status.success() {
        if !output.stderr.is_empty() {
            tracing::debug!(stderr = %output.stderr.trim_end(), "Worker set stderr");
        }
        return Ok(output);
    }

    let code = status.code().unwrap_or(-1);
    tracing::error!(code, stderr = %output.stderr.trim_end(), "Worker set exited with failure");
    Err(ExecutionFailure::NonZeroExit { code, stderr: tail(&output.stderr) }.into())
}

async fn drain<R>(reader: Option<R>) -> String
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let Some(mut reader) = reader else {
        return String::new();
    };

    let mut buffer = Vec::new();
    if let Err(err) = reader.read_to_end(&mut buffer).await {
        tracing::debug!(error = %err, "Worker pipe closed with error");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

async fn collect(handle: &mut JoinHandle<String>, deadline: Instant, pipe: &str) -> String {
    match timeout_at(deadline, &mut *handle).await {
        Ok(joined) => joined.unwrap_or_default(),
        Err(_) => {
            handle.abort();
            tracing::warn!(pipe, "Worker pipe still open at deadline; output dropped");
            String::new()
        }
    }
}

fn tail(text: &str) -> String {
    let trimmed = text.trim();
    let count = trimmed.chars().count();
    if count <= STDERR_TAIL_CHARS {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - STDERR_TAIL_CHARS).collect()
}
