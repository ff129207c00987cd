use std::collections::HashMap;

use serde::Serialize;

pub(crate) mod evaluation;

#[derive(Debug, Serialize)]
pub(crate) struct HealthResponse {
    pub(crate) service: String,
    pub(crate) status: String,
    pub(crate) components: HashMap<String, String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct RootResponse {
    pub(crate) message: String,
    pub(crate) version: String,
    pub(crate) api_prefix: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct SystemInfoResponse {
    pub(crate) app_name: String,
    pub(crate) environment: &'static str,
    pub(crate) worker_path: String,
    pub(crate) worker_mode: &'static str,
    pub(crate) supported_operations: SupportedOperations,
}

#[derive(Debug, Serialize)]
pub(crate) struct SupportedOperations {
    pub(crate) max_parallel_processes: u32,
    pub(crate) default_parallel_processes: u32,
    pub(crate) timeout_seconds: u64,
    pub(crate) supported_question_types: Vec<&'static str>,
}
