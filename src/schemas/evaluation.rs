use serde::Deserialize;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct EvaluateExamRequest {
    #[validate(length(min = 1, message = "exam_id must not be empty"))]
    pub(crate) exam_id: String,
    #[serde(default)]
    #[serde(alias = "parallelProcesses")]
    #[validate(range(min = 1, max = 16, message = "parallel_processes must be between 1 and 16"))]
    pub(crate) parallel_processes: Option<u32>,
}
