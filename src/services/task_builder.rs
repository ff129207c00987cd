use std::collections::HashMap;

use crate::db::models::{ApplicantResponse, Question};
use crate::db::types::QuestionType;

/// One response paired with everything needed to grade it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct GradeTask {
    pub(crate) response_id: String,
    pub(crate) session_id: String,
    pub(crate) question_id: String,
    pub(crate) applicant_answer: String,
    pub(crate) correct_answer: String,
    pub(crate) question_type: QuestionType,
    pub(crate) points: u32,
    pub(crate) options: Vec<String>,
}

/// Tasks for one job plus the input counts reported in the job metadata.
#[derive(Debug, Clone, Default)]
pub(crate) struct TaskBatch {
    pub(crate) tasks: Vec<GradeTask>,
    pub(crate) total_responses: usize,
    pub(crate) total_questions: usize,
}

impl TaskBatch {
    pub(crate) fn len(&self) -> usize {
        self.tasks.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub(crate) fn total_points(&self) -> u64 {
        self.tasks.iter().map(|task| u64::from(task.points)).sum()
    }
}

/// Joins responses with their questions. Responses whose question is not part of
/// `questions` are dropped; the remaining tasks keep the order of `responses`.
pub(crate) fn build(responses: &[ApplicantResponse], questions: &[Question]) -> TaskBatch {
    let by_id: HashMap<&str, &Question> =
        questions.iter().map(|question| (question.id.as_str(), question)).collect();

    let tasks: Vec<GradeTask> = responses
        .iter()
        .filter_map(|response| {
            let question = by_id.get(response.question_id.as_str())?;
            Some(GradeTask {
                response_id: response.id.clone(),
                session_id: response.session_id.clone(),
                question_id: response.question_id.clone(),
                applicant_answer: response.answer.clone(),
                correct_answer: question.correct_answer.clone(),
                question_type: question.question_type,
                points: u32::try_from(question.points).unwrap_or(0),
                options: question.options.0.clone(),
            })
        })
        .collect();

    let dropped = responses.len() - tasks.len();
    if dropped > 0 {
        tracing::debug!(dropped, "Skipped responses without a matching question");
    }

    TaskBatch { tasks, total_responses: responses.len(), total_questions: questions.len() }
}
