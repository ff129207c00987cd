pub(crate) mod api;
pub(crate) mod core;
pub(crate) mod db;
pub(crate) mod repositories;
pub(crate) mod schemas;
pub(crate) mod services;

#[cfg(test)]
mod test_support;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;

use crate::core::{config::Settings, state::AppState, telemetry};
use crate::repositories::PgEvaluationStore;
use crate::services::dispatcher::simulator;
use crate::services::evaluation::EvaluationOrchestrator;

pub async fn run() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = Settings::load()?;
    telemetry::init_tracing(&settings)?;
    core::metrics::init(&settings)?;

    let db_pool = db::init_pool(&settings).await?;
    db::run_migrations(&db_pool).await?;

    let store = Arc::new(PgEvaluationStore::new(db_pool.clone()));
    let orchestrator = EvaluationOrchestrator::from_settings(store, settings.evaluation());
    let state = AppState::new(settings, db_pool, orchestrator);

    let app = api::router::router(state.clone());
    let listener = tokio::net::TcpListener::bind(state.settings().server_addr()).await?;

    let evaluation = state.settings().evaluation();
    tracing::info!(
        host = %state.settings().server_host(),
        port = state.settings().server_port(),
        environment = %state.settings().runtime().environment.as_str(),
        worker = ?evaluation.worker_command(),
        max_workers = evaluation.max_workers,
        "Exam evaluator listening"
    );

    axum::serve(listener, app).with_graceful_shutdown(core::shutdown::shutdown_signal()).await?;

    Ok(())
}

/// Entry point of the `grade-simulator` worker: `<input_path> <output_path> <worker_count>`.
pub async fn run_simulator(args: Vec<String>) -> anyhow::Result<usize> {
    let [input, output, workers] = args.as_slice() else {
        anyhow::bail!("usage: grade-simulator <input_path> <output_path> <worker_count>");
    };

    let worker_count: u32 =
        workers.parse().with_context(|| format!("invalid worker count `{workers}`"))?;
    if worker_count == 0 {
        anyhow::bail!("worker count must be at least 1");
    }

    simulator::simulate(
        Path::new(input),
        Path::new(output),
        worker_count,
        Duration::ZERO,
        Duration::ZERO,
    )
    .await
    .context("simulated evaluation failed")
}
