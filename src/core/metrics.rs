use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::core::config::Settings;

static PROM_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

pub(crate) fn init(settings: &Settings) -> anyhow::Result<()> {
    if !settings.telemetry().prometheus_enabled {
        return Ok(());
    }

    let handle = PrometheusBuilder::new().install_recorder()?;
    let _ = PROM_HANDLE.set(handle);

    metrics::describe_counter!("evaluation_jobs_total", "Evaluation jobs by final status");
    metrics::describe_counter!("evaluation_tasks_total", "Grade tasks submitted to worker sets");
    metrics::describe_counter!(
        "evaluation_aggregation_failures_total",
        "Completed jobs whose results could not be aggregated or stored"
    );
    metrics::describe_histogram!(
        "evaluation_job_duration_seconds",
        metrics::Unit::Seconds,
        "Wall time of a dispatched evaluation job"
    );

    Ok(())
}

pub(crate) fn render() -> Option<String> {
    PROM_HANDLE.get().map(|handle| handle.render())
}
