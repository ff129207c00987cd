use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::Serialize;
use sqlx::PgPool;

use crate::db::types::SessionStatus;
use crate::repositories;

#[derive(Debug, Serialize)]
pub(crate) struct ExamStats {
    pub(crate) exam_id: String,
    pub(crate) total_participants: i64,
    pub(crate) completed_sessions: i64,
    pub(crate) average_score: f64,
    pub(crate) score_distribution: BTreeMap<String, u32>,
}

/// Participation and score statistics, or `None` for an unknown exam.
pub(crate) async fn exam_stats(pool: &PgPool, exam_id: &str) -> Result<Option<ExamStats>> {
    let exam = repositories::exams::find_by_id(pool, exam_id)
        .await
        .context("Failed to fetch exam")?;
    if exam.is_none() {
        return Ok(None);
    }

    let total_participants = repositories::sessions::count_by_exam(pool, exam_id)
        .await
        .context("Failed to count sessions")?;
    let completed_sessions = repositories::sessions::count_by_exam_and_status(
        pool,
        exam_id,
        SessionStatus::Completed,
    )
    .await
    .context("Failed to count completed sessions")?;
    let scores = repositories::evaluations::latest_scores_by_exam(pool, exam_id)
        .await
        .context("Failed to fetch evaluation scores")?;

    Ok(Some(ExamStats {
        exam_id: exam_id.to_string(),
        total_participants,
        completed_sessions,
        average_score: average(&scores),
        score_distribution: score_distribution(&scores),
    }))
}

pub(crate) fn average(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    scores.iter().sum::<f64>() / scores.len() as f64
}

/// Counts scores per ten-point bucket, keyed `"0-9"`, `"10-19"`, ... `"100-109"`.
pub(crate) fn score_distribution(scores: &[f64]) -> BTreeMap<String, u32> {
    let mut buckets = BTreeMap::new();
    for score in scores {
        let lower = (score.max(0.0) / 10.0).floor() as u32 * 10;
        *buckets.entry(format!("{}-{}", lower, lower + 9)).or_insert(0) += 1;
    }
    buckets
}
