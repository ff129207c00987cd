use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Hard ceiling for the number of workers a single job may request.
pub(crate) const MAX_WORKER_COUNT: u32 = 16;

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub(super) server: ServerSettings,
    pub(super) runtime: RuntimeSettings,
    pub(super) api: ApiSettings,
    pub(super) cors: CorsSettings,
    pub(super) database: DatabaseSettings,
    pub(super) evaluation: EvaluationSettings,
    pub(super) telemetry: TelemetrySettings,
}

#[derive(Debug, Clone)]
pub(crate) struct ServerSettings {
    pub(super) host: ServerHost,
    pub(super) port: ServerPort,
}

#[derive(Debug, Clone)]
pub(crate) struct ApiSettings {
    pub(crate) project_name: String,
    pub(crate) version: String,
    pub(crate) api_v1_str: String,
}

#[derive(Debug, Clone)]
pub(crate) struct CorsSettings {
    pub(crate) origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct DatabaseSettings {
    pub(crate) postgres_server: String,
    pub(crate) postgres_port: u16,
    pub(crate) postgres_user: String,
    pub(crate) postgres_password: String,
    pub(crate) postgres_db: String,
    pub(crate) database_url: Option<String>,
}

/// Everything the dispatcher needs to launch a worker set.
#[derive(Debug, Clone)]
pub(crate) struct EvaluationSettings {
    pub(crate) worker_path: String,
    pub(crate) worker_mode: WorkerMode,
    pub(crate) launcher: String,
    pub(crate) launcher_args: Vec<String>,
    pub(crate) timeout_seconds: u64,
    pub(crate) max_workers: u32,
    pub(crate) default_workers: u32,
    pub(crate) work_dir: PathBuf,
    pub(crate) simulated_task_delay_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WorkerMode {
    Auto,
    Simulator,
    Native,
}

/// How the configured worker path is turned into a process invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum WorkerCommand {
    /// Invoked directly with `input output worker_count` appended.
    Simulator { program: String, args: Vec<String> },
    /// Launched as `launcher [launcher_args] -n N binary input output`.
    Native { launcher: String, launcher_args: Vec<String>, binary: PathBuf },
}

impl WorkerCommand {
    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Simulator { .. } => "simulator",
            Self::Native { .. } => "native",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct TelemetrySettings {
    pub(crate) log_level: String,
    pub(crate) json: bool,
    pub(crate) prometheus_enabled: bool,
}

#[derive(Debug, Clone)]
pub(crate) struct RuntimeSettings {
    pub(crate) environment: Environment,
    pub(crate) strict_config: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Environment {
    Development,
    Production,
    Staging,
    Test,
}

impl Environment {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Staging => "staging",
            Self::Test => "test",
        }
    }

    pub(super) fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ServerHost(pub(super) String);

#[derive(Debug, Clone, Copy)]
pub(crate) struct ServerPort(pub(super) u16);

#[derive(Debug, Error)]
pub(crate) enum ConfigError {
    #[error("invalid server host: {0}")]
    InvalidHost(String),
    #[error("invalid server port: {0}")]
    InvalidPort(String),
    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: &'static str, value: String },
    #[error("invalid cors origins: {0}")]
    InvalidCors(String),
    #[error("missing required secret for {0}")]
    MissingSecret(&'static str),
}

impl DatabaseSettings {
    pub(crate) fn database_url(&self) -> String {
        if let Some(url) = &self.database_url {
            return url.clone();
        }

        format!(
            "postgresql://{}:{}@{}:{}/{}",
            self.postgres_user,
            self.postgres_password,
            self.postgres_server,
            self.postgres_port,
            self.postgres_db
        )
    }
}

impl EvaluationSettings {
    pub(crate) fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub(crate) fn simulated_task_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_task_delay_ms)
    }

    /// Resolves the configured worker path into a concrete invocation strategy.
    pub(crate) fn worker_command(&self) -> WorkerCommand {
        let simulator = match self.worker_mode {
            WorkerMode::Simulator => true,
            WorkerMode::Native => false,
            WorkerMode::Auto => {
                let lowered = self.worker_path.to_lowercase();
                lowered.contains("python") || lowered.contains("simulator")
            }
        };

        if simulator {
            let mut parts = self.worker_path.split_whitespace().map(str::to_string);
            let program = parts.next().unwrap_or_default();
            return WorkerCommand::Simulator { program, args: parts.collect() };
        }

        WorkerCommand::Native {
            launcher: self.launcher.clone(),
            launcher_args: self.launcher_args.clone(),
            binary: PathBuf::from(self.worker_path.trim()),
        }
    }
}

impl ServerHost {
    pub(super) fn parse(value: String) -> Result<Self, ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::InvalidHost(value));
        }

        Ok(Self(value))
    }
}

impl ServerPort {
    pub(super) fn parse(value: String) -> Result<Self, ConfigError> {
        let parsed: u16 = value.parse().map_err(|_| ConfigError::InvalidPort(value.clone()))?;
        if parsed == 0 {
            return Err(ConfigError::InvalidPort(value));
        }

        Ok(Self(parsed))
    }
}
