use std::path::PathBuf;

use super::parsing::{
    default_launcher, env_optional, env_or_default, parse_args, parse_bool, parse_cors_origins,
    parse_environment, parse_u16, parse_u32, parse_u64, parse_worker_mode,
};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, DatabaseSettings, EvaluationSettings, RuntimeSettings,
    ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings, MAX_WORKER_COUNT,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("EVALUATOR_HOST", "0.0.0.0");
        let port = env_or_default("EVALUATOR_PORT", "8000");

        let environment = parse_environment(
            env_optional("EVALUATOR_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("EVALUATOR_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Parallel Exam Evaluator");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "evaluator");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "exam_evaluator");
        let database_url = env_optional("DATABASE_URL");

        let worker_path = env_optional("EVALUATOR_WORKER_PATH")
            .or_else(|| env_optional("MPI_PROCESSOR_PATH"))
            .unwrap_or_else(|| "/app/mpi_processor/evaluator".to_string());
        let worker_mode = parse_worker_mode(env_optional("EVALUATOR_WORKER_MODE"))?;
        let launcher = env_or_default("EVALUATOR_LAUNCHER", default_launcher());
        let launcher_args = parse_args(env_optional("EVALUATOR_LAUNCHER_ARGS"));
        let timeout_seconds = parse_u64(
            "EVALUATOR_TIMEOUT_SECONDS",
            env_or_default("EVALUATOR_TIMEOUT_SECONDS", "300"),
        )?;
        let max_workers = parse_u32(
            "EVALUATOR_MAX_WORKERS",
            env_or_default("EVALUATOR_MAX_WORKERS", &MAX_WORKER_COUNT.to_string()),
        )?;
        let default_workers = parse_u32(
            "EVALUATOR_DEFAULT_WORKERS",
            env_or_default("EVALUATOR_DEFAULT_WORKERS", "4"),
        )?;
        let work_dir = env_optional("EVALUATOR_WORK_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| std::env::temp_dir().join("parallel_exam_system"));
        let simulated_task_delay_ms = parse_u64(
            "EVALUATOR_SIMULATED_TASK_DELAY_MS",
            env_or_default("EVALUATOR_SIMULATED_TASK_DELAY_MS", "100"),
        )?;

        let log_level = env_or_default("EVALUATOR_LOG_LEVEL", "info");
        let json = env_optional("EVALUATOR_LOG_JSON")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);
        let prometheus_enabled = env_optional("PROMETHEUS_ENABLED")
            .map(|value| parse_bool(&value))
            .unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
            },
            evaluation: EvaluationSettings {
                worker_path,
                worker_mode,
                launcher,
                launcher_args,
                timeout_seconds,
                max_workers,
                default_workers,
                work_dir,
                simulated_task_delay_ms,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn evaluation(&self) -> &EvaluationSettings {
        &self.evaluation
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let evaluation = &self.evaluation;

        if evaluation.worker_path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "EVALUATOR_WORKER_PATH",
                value: String::from("<empty>"),
            });
        }

        if evaluation.timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue {
                field: "EVALUATOR_TIMEOUT_SECONDS",
                value: "0".to_string(),
            });
        }

        if evaluation.max_workers == 0 || evaluation.max_workers > MAX_WORKER_COUNT {
            return Err(ConfigError::InvalidValue {
                field: "EVALUATOR_MAX_WORKERS",
                value: evaluation.max_workers.to_string(),
            });
        }

        if evaluation.default_workers == 0 || evaluation.default_workers > evaluation.max_workers {
            return Err(ConfigError::InvalidValue {
                field: "EVALUATOR_DEFAULT_WORKERS",
                value: evaluation.default_workers.to_string(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }

        Ok(())
    }
}
