pub(crate) mod aggregation;
pub(crate) mod dispatcher;
pub(crate) mod evaluation;
pub(crate) mod grading_engine;
pub(crate) mod reports;
pub(crate) mod task_builder;
