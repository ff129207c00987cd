pub(crate) mod errors;
pub(crate) mod evaluations;
pub(crate) mod exams;
pub(crate) mod handlers;
pub(crate) mod router;
pub(crate) mod system;
