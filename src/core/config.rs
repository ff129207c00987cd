mod parsing;
mod settings;
mod types;

pub(crate) use types::{EvaluationSettings, Settings, WorkerCommand, MAX_WORKER_COUNT};
