use serde::{Deserialize, Serialize};

/// Sequential question number, starting at 1 for each session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QuestionId(pub u32);

impl std::fmt::Display for QuestionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, strum_macros::Display,
)]
pub enum QuestionStatus {
    #[strum(serialize = "not started")]
    NotStarted,
    #[strum(serialize = "active")]
    Active,
    #[strum(serialize = "paused")]
    Paused,
    #[strum(serialize = "skipped")]
    Skipped,
    #[strum(serialize = "completed")]
    Completed,
}

impl QuestionStatus {
    pub const ALL: [QuestionStatus; 5] = [
        QuestionStatus::NotStarted,
        QuestionStatus::Active,
        QuestionStatus::Paused,
        QuestionStatus::Skipped,
        QuestionStatus::Completed,
    ];

    pub fn is_terminal(self) -> bool {
        self == QuestionStatus::Completed
    }
}

/// Per-question tracking state.
///
/// `time_spent_ms` only grows through clock ticks while the record is the
/// linked active question; status transitions never touch it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub id: QuestionId,
    pub status: QuestionStatus,
    pub time_spent_ms: u64,
    pub was_skipped: bool,
}

impl QuestionRecord {
    pub fn new(id: QuestionId) -> Self {
        Self {
            id,
            status: QuestionStatus::NotStarted,
            time_spent_ms: 0,
            was_skipped: false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == QuestionStatus::Active
    }

    /// Completed after having been skipped at least once
    pub fn completed_after_skip(&self) -> bool {
        self.status == QuestionStatus::Completed && self.was_skipped
    }
}
