pub(crate) mod evaluations;
pub(crate) mod exams;
pub(crate) mod questions;
pub(crate) mod responses;
pub(crate) mod sessions;
pub(crate) mod store;

pub(crate) use store::{EvaluationStore, PgEvaluationStore};
