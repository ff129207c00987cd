use std::collections::{HashMap, HashSet};

use serde::Serialize;
use thiserror::Error;
use time::{format_description::well_known::Rfc3339, OffsetDateTime, PrimitiveDateTime};
use uuid::Uuid;

use crate::core::time::primitive_now_utc;
use crate::db::models::Exam;
use crate::services::dispatcher::protocol::ResultEntry;
use crate::services::task_builder::GradeTask;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum AggregationError {
    #[error("result entry has invalid {field} `{value}`")]
    InvalidId { field: &'static str, value: String },
    #[error("response {response_id} was submitted for session {expected} but graded for {found}")]
    SessionMismatch { response_id: String, expected: String, found: String },
    #[error("response {response_id} reports negative points ({points})")]
    NegativePoints { response_id: String, points: i64 },
}

/// Final grade for one response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct GradeRecord {
    pub(crate) response_id: String,
    pub(crate) session_id: String,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: u32,
    pub(crate) evaluated_at: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct SessionScore {
    pub(crate) session_id: String,
    pub(crate) total_points: u64,
    pub(crate) correct_count: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ExamTotals {
    pub(crate) total_points: u32,
    pub(crate) total_questions: u32,
}

impl From<&Exam> for ExamTotals {
    fn from(exam: &Exam) -> Self {
        Self {
            total_points: u32::try_from(exam.total_points).unwrap_or(0),
            total_questions: u32::try_from(exam.total_questions).unwrap_or(0),
        }
    }
}

/// Per-session row written to `evaluations`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct EvaluationSummary {
    pub(crate) session_id: String,
    pub(crate) total_questions: u32,
    pub(crate) correct_answers: u32,
    pub(crate) total_points: u64,
    pub(crate) score_percentage: f64,
}

impl SessionScore {
    pub(crate) fn summarize(&self, exam: ExamTotals) -> EvaluationSummary {
        let score_percentage = if exam.total_points == 0 {
            0.0
        } else {
            self.total_points as f64 / f64::from(exam.total_points) * 100.0
        };

        EvaluationSummary {
            session_id: self.session_id.clone(),
            total_questions: exam.total_questions,
            correct_answers: self.correct_count,
            total_points: self.total_points,
            score_percentage,
        }
    }
}

#[derive(Debug, Default, Clone, PartialEq)]
pub(crate) struct Aggregate {
    pub(crate) records: Vec<GradeRecord>,
    pub(crate) sessions: Vec<SessionScore>,
}

/// Folds worker results for one job into grade records and per-session totals.
///
/// Only results that match a submitted task are kept; each response is counted once.
pub(crate) struct ResultAggregator<'a> {
    tasks: HashMap<&'a str, &'a GradeTask>,
}

impl<'a> ResultAggregator<'a> {
    pub(crate) fn new(tasks: &'a [GradeTask]) -> Self {
        Self { tasks: tasks.iter().map(|task| (task.response_id.as_str(), task)).collect() }
    }

    pub(crate) fn aggregate(
        &self,
        results: &[ResultEntry],
    ) -> Result<Aggregate, AggregationError> {
        let mut aggregate = Aggregate::default();
        let mut session_index: HashMap<String, usize> = HashMap::new();
        let mut seen: HashSet<&str> = HashSet::new();
        let mut skipped = 0usize;

        for entry in results {
            validate_id("response_id", &entry.response_id)?;
            validate_id("session_id", &entry.session_id)?;
            validate_id("question_id", &entry.question_id)?;

            let Some(task) = self.tasks.get(entry.response_id.as_str()) else {
                skipped += 1;
                continue;
            };
            if !seen.insert(task.response_id.as_str()) {
                skipped += 1;
                continue;
            }
            if task.session_id != entry.session_id {
                return Err(AggregationError::SessionMismatch {
                    response_id: entry.response_id.clone(),
                    expected: task.session_id.clone(),
                    found: entry.session_id.clone(),
                });
            }
            if entry.points_earned < 0 {
                return Err(AggregationError::NegativePoints {
                    response_id: entry.response_id.clone(),
                    points: entry.points_earned,
                });
            }

            let points_earned = if entry.is_correct {
                u32::try_from(entry.points_earned).unwrap_or(u32::MAX).min(task.points)
            } else {
                0
            };

            let index = *session_index.entry(task.session_id.clone()).or_insert_with(|| {
                aggregate.sessions.push(SessionScore {
                    session_id: task.session_id.clone(),
                    total_points: 0,
                    correct_count: 0,
                });
                aggregate.sessions.len() - 1
            });
            let session = &mut aggregate.sessions[index];
            session.total_points += u64::from(points_earned);
            if entry.is_correct {
                session.correct_count += 1;
            }

            aggregate.records.push(GradeRecord {
                response_id: task.response_id.clone(),
                session_id: task.session_id.clone(),
                is_correct: entry.is_correct,
                points_earned,
                evaluated_at: parse_evaluation_time(&entry.evaluation_time),
            });
        }

        if skipped > 0 {
            tracing::warn!(skipped, "Ignored results that do not match a submitted task");
        }

        Ok(aggregate)
    }
}

fn validate_id(field: &'static str, value: &str) -> Result<(), AggregationError> {
    Uuid::parse_str(value)
        .map(|_| ())
        .map_err(|_| AggregationError::InvalidId { field, value: value.to_string() })
}

fn parse_evaluation_time(value: &str) -> PrimitiveDateTime {
    match OffsetDateTime::parse(value, &Rfc3339) {
        Ok(parsed) => {
            let utc = parsed.to_offset(time::UtcOffset::UTC);
            PrimitiveDateTime::new(utc.date(), utc.time())
        }
        Err(_) => primitive_now_utc(),
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::db::types::QuestionType;

    fn task(response_id: &str, session_id: &str, points: u32) -> GradeTask {
        GradeTask {
            response_id: response_id.to_string(),
            session_id: session_id.to_string(),
            question_id: Uuid::new_v4().to_string(),
            applicant_answer: "a".to_string(),
            correct_answer: "a".to_string(),
            question_type: QuestionType::MultipleChoice,
            points,
            options: Vec::new(),
        }
    }

    fn result(task: &GradeTask, is_correct: bool, points_earned: i64) -> ResultEntry {
        ResultEntry {
            response_id: task.response_id.clone(),
            session_id: task.session_id.clone(),
            question_id: task.question_id.clone(),
            is_correct,
            points_earned,
            evaluation_time: "2025-01-02T10:20:30Z".to_string(),
            processed_by_rank: None,
        }
    }

    fn id() -> String {
        Uuid::new_v4().to_string()
    }

    #[test]
    fn session_summary_matches_exam_totals() {
        let session = id();
        let tasks = vec![task(&id(), &session, 5), task(&id(), &session, 5)];
        let results = vec![result(&tasks[0], true, 5), result(&tasks[1], false, 0)];

        let aggregate = ResultAggregator::new(&tasks).aggregate(&results).expect("aggregate");
        let summary =
            aggregate.sessions[0].summarize(ExamTotals { total_points: 10, total_questions: 2 });

        assert_eq!(aggregate.records.len(), 2);
        assert_eq!(summary.total_points, 5);
        assert_eq!(summary.correct_answers, 1);
        assert_eq!(summary.total_questions, 2);
        assert!((summary.score_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn zero_exam_points_yield_zero_percentage() {
        let score = SessionScore { session_id: id(), total_points: 4, correct_count: 2 };
        let summary = score.summarize(ExamTotals { total_points: 0, total_questions: 3 });
        assert_eq!(summary.score_percentage, 0.0);
    }

    #[test]
    fn sessions_are_grouped_in_first_seen_order() {
        let (first, second) = (id(), id());
        let tasks =
            vec![task(&id(), &second, 2), task(&id(), &first, 3), task(&id(), &second, 4)];
        let results: Vec<ResultEntry> = tasks.iter().map(|task| result(task, true, 100)).collect();

        let aggregate = ResultAggregator::new(&tasks).aggregate(&results).expect("aggregate");

        let totals: Vec<(&str, u64, u32)> = aggregate
            .sessions
            .iter()
            .map(|score| (score.session_id.as_str(), score.total_points, score.correct_count))
            .collect();
        assert_eq!(totals, vec![(second.as_str(), 6, 2), (first.as_str(), 3, 1)]);
    }

    #[test]
    fn unknown_and_duplicate_results_are_ignored() {
        let session = id();
        let tasks = vec![task(&id(), &session, 5)];
        let stranger = task(&id(), &session, 5);
        let results = vec![
            result(&tasks[0], true, 5),
            result(&tasks[0], true, 5),
            result(&stranger, true, 5),
        ];

        let aggregate = ResultAggregator::new(&tasks).aggregate(&results).expect("aggregate");

        assert_eq!(aggregate.records.len(), 1);
        assert_eq!(aggregate.sessions[0].total_points, 5);
    }

    #[test]
    fn unparseable_ids_abort_aggregation() {
        let tasks = vec![task("not-a-uuid", &id(), 5)];
        let results = vec![result(&tasks[0], true, 5)];

        let err = ResultAggregator::new(&tasks).aggregate(&results).expect_err("invalid id");

        assert_eq!(
            err,
            AggregationError::InvalidId { field: "response_id", value: "not-a-uuid".to_string() }
        );
    }

    #[test]
    fn session_mismatch_aborts_aggregation() {
        let tasks = vec![task(&id(), &id(), 5)];
        let mut entry = result(&tasks[0], true, 5);
        entry.session_id = id();

        let err = ResultAggregator::new(&tasks).aggregate(&[entry]).expect_err("mismatch");

        assert!(matches!(err, AggregationError::SessionMismatch { .. }));
    }

    #[test]
    fn negative_points_abort_aggregation() {
        let tasks = vec![task(&id(), &id(), 5)];
        let err = ResultAggregator::new(&tasks)
            .aggregate(&[result(&tasks[0], true, -1)])
            .expect_err("negative points");

        assert!(matches!(err, AggregationError::NegativePoints { points: -1, .. }));
    }

    #[test]
    fn evaluation_time_is_normalized_to_utc() {
        let parsed = parse_evaluation_time("2025-01-02T13:20:30+03:00");
        assert_eq!(parsed, time::macros::datetime!(2025-01-02 10:20:30));
    }

    proptest! {
        #[test]
        fn records_never_exceed_submitted_points(
            grades in prop::collection::vec((1u32..20, any::<bool>(), 0i64..40), 1..24),
            sessions in 1usize..4,
        ) {
            let session_ids: Vec<String> = (0..sessions).map(|_| id()).collect();
            let tasks: Vec<GradeTask> = grades
                .iter()
                .enumerate()
                .map(|(idx, (points, _, _))| task(&id(), &session_ids[idx % sessions], *points))
                .collect();
            let results: Vec<ResultEntry> = tasks
                .iter()
                .zip(&grades)
                .map(|(task, (_, correct, earned))| result(task, *correct, *earned))
                .collect();

            let aggregate = ResultAggregator::new(&tasks).aggregate(&results).expect("aggregate");

            let earned: u64 = aggregate.records.iter().map(|r| u64::from(r.points_earned)).sum();
            let submitted: u64 = tasks.iter().map(|task| u64::from(task.points)).sum();
            prop_assert!(earned <= submitted);
            for record in &aggregate.records {
                if !record.is_correct {
                    prop_assert_eq!(record.points_earned, 0);
                }
            }
            let session_total: u64 = aggregate.sessions.iter().map(|s| s.total_points).sum();
            prop_assert_eq!(session_total, earned);
        }
    }
}
