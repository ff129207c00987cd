//! Answer correctness rules shared by the in-process simulator and the
//! `grade-simulator` worker binary.

use crate::db::types::QuestionType;

/// Essays pass once the normalized answer is longer than this many characters.
pub(crate) const ESSAY_MIN_LENGTH: usize = 10;

/// Decides whether `applicant_answer` is correct for a question of `question_type`.
///
/// Both answers are trimmed and lowercased first. Choice, true/false and short answer
/// questions need an exact match; essays are accepted on length alone.
pub(crate) fn grade(
    applicant_answer: &str,
    correct_answer: &str,
    question_type: QuestionType,
) -> bool {
    let applicant = normalize(applicant_answer);

    match question_type {
        QuestionType::MultipleChoice | QuestionType::TrueFalse | QuestionType::ShortAnswer => {
            applicant == normalize(correct_answer)
        }
        QuestionType::Essay => applicant.chars().count() > ESSAY_MIN_LENGTH,
    }
}

/// Points awarded for a graded answer.
pub(crate) fn points_earned(is_correct: bool, points: u32) -> u32 {
    if is_correct {
        points
    } else {
        0
    }
}

fn normalize(answer: &str) -> String {
    answer.trim().to_lowercase()
}
