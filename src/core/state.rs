use std::sync::Arc;

use sqlx::PgPool;

use crate::core::config::Settings;
use crate::services::evaluation::EvaluationOrchestrator;

#[derive(Clone)]
pub(crate) struct AppState {
    inner: Arc<InnerState>,
}

struct InnerState {
    settings: Settings,
    db: PgPool,
    orchestrator: EvaluationOrchestrator,
}

impl AppState {
    pub(crate) fn new(
        settings: Settings,
        db: PgPool,
        orchestrator: EvaluationOrchestrator,
    ) -> Self {
        Self { inner: Arc::new(InnerState { settings, db, orchestrator }) }
    }

    pub(crate) fn settings(&self) -> &Settings {
        &self.inner.settings
    }

    pub(crate) fn db(&self) -> &PgPool {
        &self.inner.db
    }

    pub(crate) fn orchestrator(&self) -> &EvaluationOrchestrator {
        &self.inner.orchestrator
    }
}
