//! Post-session breakdowns computed from a [`SessionSnapshot`].
//!
//! Nothing here mutates question records. Manual review tags live in a
//! separate [`ReviewSheet`] keyed by question id.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::question::{QuestionId, QuestionRecord, QuestionStatus};
use crate::session::SessionSnapshot;
use crate::util::{format_bound_secs, mean, percentage};

#[derive(Debug, Clone, PartialEq)]
pub struct TimeBucket {
    pub label: String,
    pub lower_ms: u64,
    /// `None` for the open-ended last bucket
    pub upper_ms: Option<u64>,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusCount {
    pub status: QuestionStatus,
    pub count: usize,
    pub percent: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StatusDistribution {
    pub counts: Vec<StatusCount>,
    pub clean_completions: usize,
    pub completed_after_skip: usize,
    pub total: usize,
}

impl StatusDistribution {
    pub fn count(&self, status: QuestionStatus) -> usize {
        self.counts
            .iter()
            .find(|c| c.status == status)
            .map_or(0, |c| c.count)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Totals {
    /// Sum of per-question time
    pub question_time_ms: u64,
    /// Time consumed from the session budget
    pub elapsed_ms: u64,
    pub allocated_ms: i64,
    pub overtime_ms: u64,
    pub attempted: usize,
    pub average_attempted_ms: Option<u64>,
}

/// Questions with any recorded time
fn attempted(records: &[QuestionRecord]) -> impl Iterator<Item = &QuestionRecord> {
    records.iter().filter(|r| r.time_spent_ms > 0)
}

/// Bucket every question by time spent.
///
/// Bounds `[b0, b1, .., bn]` (seconds) produce `[0,b0)`, `[b0,b1)`, ..,
/// `[bn,inf)`. Unattempted questions land in the first bucket. Percentages
/// are relative to the number of questions in the session.
pub fn time_distribution(snapshot: &SessionSnapshot) -> Vec<TimeBucket> {
    let bounds_ms = snapshot.config.bucket_bounds_ms();

    let mut counts = vec![0usize; bounds_ms.len() + 1];
    for record in &snapshot.records {
        let idx = bounds_ms
            .iter()
            .position(|&b| record.time_spent_ms < b)
            .unwrap_or(bounds_ms.len());
        counts[idx] += 1;
    }
    let total = snapshot.records.len();

    let secs = &snapshot.config.bucket_bounds_secs;
    counts
        .into_iter()
        .enumerate()
        .map(|(idx, count)| {
            let lower = if idx == 0 { 0 } else { secs[idx - 1] };
            let lower_ms = if idx == 0 { 0 } else { bounds_ms[idx - 1] };
            let upper = secs.get(idx).copied();
            let label = match (idx, upper) {
                (_, None) if secs.is_empty() => "all".to_string(),
                (_, None) => format!("{}+", format_bound_secs(lower)),
                (0, Some(u)) => format!("<{}", format_bound_secs(u)),
                (_, Some(u)) => format!("{}-{}", format_bound_secs(lower), format_bound_secs(u)),
            };
            TimeBucket {
                label,
                lower_ms,
                upper_ms: bounds_ms.get(idx).copied(),
                count,
                percent: percentage(count, total),
            }
        })
        .collect()
}

pub fn status_distribution(snapshot: &SessionSnapshot) -> StatusDistribution {
    let total = snapshot.records.len();
    let by_status = snapshot.records.iter().counts_by(|r| r.status);

    let counts = QuestionStatus::ALL
        .iter()
        .map(|&status| {
            let count = by_status.get(&status).copied().unwrap_or(0);
            StatusCount {
                status,
                count,
                percent: percentage(count, total),
            }
        })
        .collect();

    let completed_after_skip = snapshot
        .records
        .iter()
        .filter(|r| r.completed_after_skip())
        .count();
    let completed = by_status
        .get(&QuestionStatus::Completed)
        .copied()
        .unwrap_or(0);

    StatusDistribution {
        counts,
        clean_completions: completed - completed_after_skip,
        completed_after_skip,
        total,
    }
}

pub fn totals(snapshot: &SessionSnapshot) -> Totals {
    let times: Vec<f64> = attempted(&snapshot.records)
        .map(|r| r.time_spent_ms as f64)
        .collect();

    Totals {
        question_time_ms: snapshot.records.iter().map(|r| r.time_spent_ms).sum(),
        elapsed_ms: snapshot.elapsed_ms(),
        allocated_ms: snapshot.total_allocated_ms,
        overtime_ms: snapshot.overtime_ms(),
        attempted: times.len(),
        average_attempted_ms: mean(&times).map(|m| m.round() as u64),
    }
}

/// Questions at or over the long-question threshold, longest first
pub fn long_questions(snapshot: &SessionSnapshot) -> Vec<QuestionId> {
    let threshold = snapshot.config.long_question_threshold_ms();
    snapshot
        .records
        .iter()
        .filter(|r| r.time_spent_ms >= threshold)
        .sorted_by(|a, b| b.time_spent_ms.cmp(&a.time_spent_ms).then(a.id.cmp(&b.id)))
        .map(|r| r.id)
        .collect()
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Correctness {
    #[strum(serialize = "correct")]
    Correct,
    #[strum(serialize = "incorrect")]
    Incorrect,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Difficulty {
    #[strum(serialize = "easy")]
    Easy,
    #[strum(serialize = "medium")]
    Medium,
    #[strum(serialize = "hard")]
    Hard,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewTag {
    pub correctness: Option<Correctness>,
    pub difficulty: Option<Difficulty>,
}

impl ReviewTag {
    pub fn is_empty(&self) -> bool {
        self.correctness.is_none() && self.difficulty.is_none()
    }
}

/// Manual correctness/difficulty tags entered during review
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReviewSheet {
    tags: BTreeMap<QuestionId, ReviewTag>,
}

impl ReviewSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: QuestionId) -> ReviewTag {
        self.tags.get(&id).copied().unwrap_or_default()
    }

    pub fn set_correctness(&mut self, id: QuestionId, correctness: Correctness) {
        self.tags.entry(id).or_default().correctness = Some(correctness);
    }

    pub fn set_difficulty(&mut self, id: QuestionId, difficulty: Difficulty) {
        self.tags.entry(id).or_default().difficulty = Some(difficulty);
    }

    pub fn clear(&mut self, id: QuestionId) {
        self.tags.remove(&id);
    }

    pub fn tagged_count(&self) -> usize {
        self.tags.values().filter(|t| !t.is_empty()).count()
    }
}

/// Everything the analytics screen shows, computed once per snapshot
#[derive(Debug, Clone)]
pub struct SessionReport {
    pub time_distribution: Vec<TimeBucket>,
    pub status_distribution: StatusDistribution,
    pub totals: Totals,
    pub long_questions: Vec<QuestionId>,
}

impl SessionReport {
    pub fn build(snapshot: &SessionSnapshot) -> Self {
        Self {
            time_distribution: time_distribution(snapshot),
            status_distribution: status_distribution(snapshot),
            totals: totals(snapshot),
            long_questions: long_questions(snapshot),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionConfig;
    use chrono::Local;

    fn record(n: u32, status: QuestionStatus, secs: u64, was_skipped: bool) -> QuestionRecord {
        QuestionRecord {
            id: QuestionId(n),
            status,
            time_spent_ms: secs * 1000,
            was_skipped,
        }
    }

    fn snapshot(records: Vec<QuestionRecord>, remaining_ms: i64) -> SessionSnapshot {
        let config = SessionConfig::default();
        SessionSnapshot {
            total_allocated_ms: config.total_allocated_ms(records.len()),
            records,
            remaining_ms,
            config,
            started_at: Local::now(),
        }
    }

    fn sample() -> SessionSnapshot {
        snapshot(
            vec![
                record(1, QuestionStatus::Completed, 30, false),
                record(2, QuestionStatus::Completed, 200, true),
                record(3, QuestionStatus::Skipped, 90, true),
                record(4, QuestionStatus::Paused, 185, false),
                record(5, QuestionStatus::NotStarted, 0, false),
            ],
            0,
        )
    }

    #[test]
    fn test_time_distribution_buckets() {
        let buckets = time_distribution(&sample());

        let labels: Vec<&str> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["<1m", "1m-2m", "2m-3m", "3m+"]);

        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![2, 1, 0, 2]);
        assert_eq!(buckets[0].percent, 40.0);
        assert_eq!(buckets[3].percent, 40.0);
        assert_eq!(buckets[3].upper_ms, None);
        assert_eq!(buckets[1].lower_ms, 60_000);
    }

    #[test]
    fn test_time_distribution_bound_is_exclusive_upper() {
        let snap = snapshot(vec![record(1, QuestionStatus::Completed, 60, false)], 0);
        let buckets = time_distribution(&snap);
        assert_eq!(buckets[0].count, 0);
        assert_eq!(buckets[1].count, 1);
    }

    #[test]
    fn test_time_distribution_without_bounds() {
        let mut snap = sample();
        snap.config.bucket_bounds_secs.clear();

        let buckets = time_distribution(&snap);
        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, "all");
        assert_eq!(buckets[0].count, 5);
        assert_eq!(buckets[0].percent, 100.0);
    }

    #[test]
    fn test_time_distribution_empty_session_has_zero_percentages() {
        let snap = snapshot(vec![], 0);
        assert!(time_distribution(&snap)
            .iter()
            .all(|b| b.count == 0 && b.percent == 0.0));
    }

    #[test]
    fn test_time_distribution_counts_unattempted_questions() {
        // one timed question among three: the other two sit in the first bucket
        let snap = snapshot(
            vec![
                record(1, QuestionStatus::Completed, 30, false),
                record(2, QuestionStatus::NotStarted, 0, false),
                record(3, QuestionStatus::NotStarted, 0, false),
            ],
            0,
        );
        let buckets = time_distribution(&snap);

        let counts: Vec<usize> = buckets.iter().map(|b| b.count).collect();
        assert_eq!(counts, vec![3, 0, 0, 0]);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 3);
        assert_eq!(buckets[0].percent, 100.0);

        let snap = snapshot(
            vec![
                record(1, QuestionStatus::Completed, 90, false),
                record(2, QuestionStatus::NotStarted, 0, false),
            ],
            0,
        );
        let percents: Vec<f64> = time_distribution(&snap).iter().map(|b| b.percent).collect();
        assert_eq!(percents, vec![50.0, 50.0, 0.0, 0.0]);
    }

    #[test]
    fn test_time_distribution_labels_second_bounds() {
        let mut snap = sample();
        snap.config.bucket_bounds_secs = vec![45, 90];

        let labels: Vec<String> = time_distribution(&snap)
            .into_iter()
            .map(|b| b.label)
            .collect();
        assert_eq!(labels, vec!["<45s", "45s-1m30s", "1m30s+"]);
    }

    #[test]
    fn test_oversized_thresholds_do_not_overflow() {
        let mut snap = sample();
        snap.config.long_question_threshold_secs = u64::MAX / 10;
        snap.config.bucket_bounds_secs = vec![60, u64::MAX];

        assert!(long_questions(&snap).is_empty());
        let buckets = time_distribution(&snap);
        assert_eq!(buckets[2].lower_ms, u64::MAX);
        assert_eq!(buckets.iter().map(|b| b.count).sum::<usize>(), 5);
    }

    #[test]
    fn test_status_distribution() {
        let dist = status_distribution(&sample());

        assert_eq!(dist.total, 5);
        assert_eq!(dist.count(QuestionStatus::Completed), 2);
        assert_eq!(dist.count(QuestionStatus::Skipped), 1);
        assert_eq!(dist.count(QuestionStatus::Active), 0);
        assert_eq!(dist.clean_completions, 1);
        assert_eq!(dist.completed_after_skip, 1);
        assert_eq!(dist.counts[0].status, QuestionStatus::NotStarted);
        assert_eq!(dist.counts[0].percent, 20.0);
    }

    #[test]
    fn test_totals() {
        let snap = snapshot(sample().records, -4_000);
        let totals = totals(&snap);

        assert_eq!(totals.question_time_ms, 505_000);
        assert_eq!(totals.attempted, 4);
        assert_eq!(totals.average_attempted_ms, Some(126_250));
        assert_eq!(totals.allocated_ms, 600_000);
        assert_eq!(totals.elapsed_ms, 604_000);
        assert_eq!(totals.overtime_ms, 4_000);
    }

    #[test]
    fn test_long_questions_sorted_longest_first() {
        assert_eq!(
            long_questions(&sample()),
            vec![QuestionId(2), QuestionId(4)]
        );
    }

    #[test]
    fn test_review_sheet_tags() {
        let mut sheet = ReviewSheet::new();
        let id = QuestionId(2);

        assert!(sheet.get(id).is_empty());

        sheet.set_correctness(id, Correctness::Incorrect);
        sheet.set_difficulty(id, Difficulty::Hard);
        sheet.set_correctness(id, Correctness::Correct);
        assert_eq!(
            sheet.get(id),
            ReviewTag {
                correctness: Some(Correctness::Correct),
                difficulty: Some(Difficulty::Hard),
            }
        );
        assert_eq!(sheet.tagged_count(), 1);

        sheet.clear(id);
        assert!(sheet.get(id).is_empty());
        assert_eq!(sheet.tagged_count(), 0);
    }

    #[test]
    fn test_report_build() {
        let report = SessionReport::build(&sample());
        assert_eq!(report.time_distribution.len(), 4);
        assert_eq!(report.long_questions.len(), 2);
        assert_eq!(report.status_distribution.total, 5);
    }
}
