use chrono::{DateTime, Local};
use log::{debug, info};
use serde::Serialize;

use crate::clock::{MonotonicTimeSource, SessionClock, TickDelta, TimeSource};
use crate::config::SessionConfig;
use crate::question::{QuestionId, QuestionRecord, QuestionStatus};
use crate::registry::{IgnoreReason, QuestionRegistry, Transition};

/// Owned copy of a session's state for analytics and export
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub records: Vec<QuestionRecord>,
    pub total_allocated_ms: i64,
    pub remaining_ms: i64,
    pub config: SessionConfig,
    pub started_at: DateTime<Local>,
}

impl SessionSnapshot {
    /// Wall time consumed by the session clock
    pub fn elapsed_ms(&self) -> u64 {
        (self.total_allocated_ms - self.remaining_ms).max(0) as u64
    }

    pub fn overtime_ms(&self) -> u64 {
        if self.remaining_ms < 0 {
            self.remaining_ms.unsigned_abs()
        } else {
            0
        }
    }
}

/// Single owner of the question registry and the session clock.
///
/// Every mutation goes through this type. Before any operation that changes
/// which question is linked, or whether the clock runs, the clock is settled:
/// it ticks once at the current instant so the interval since the last tick
/// is charged to whoever was active during it. That keeps wall time
/// partitioned across ticks without gaps or double counting.
#[derive(Debug)]
pub struct SessionController<T: TimeSource = MonotonicTimeSource> {
    registry: QuestionRegistry,
    clock: SessionClock,
    config: SessionConfig,
    time_source: T,
    started_at: DateTime<Local>,
    finished: bool,
}

impl SessionController<MonotonicTimeSource> {
    pub fn with_system_clock(question_count: usize, config: SessionConfig) -> Self {
        Self::start(question_count, config, MonotonicTimeSource)
    }
}

impl<T: TimeSource> SessionController<T> {
    /// Create a fresh registry and start the clock with the view active.
    ///
    /// `question_count` and `config` are expected to be validated by the
    /// caller.
    pub fn start(question_count: usize, config: SessionConfig, time_source: T) -> Self {
        let total = config.total_allocated_ms(question_count);
        let mut clock = SessionClock::new(total);
        clock.set_view_active(true, time_source.now());

        info!(
            "session started: {} questions, {} min each, {} ms allocated",
            question_count, config.ideal_minutes_per_question, total
        );

        Self {
            registry: QuestionRegistry::new(question_count),
            clock,
            config,
            time_source,
            started_at: Local::now(),
            finished: false,
        }
    }

    fn settle(&mut self) -> Option<TickDelta> {
        let now = self.time_source.now();
        let tick = self.clock.advance(now)?;
        if let Some(id) = tick.linked {
            if !self.registry.credit(id, tick.delta_ms) {
                debug!("clock linked to {id} which is not active, nothing credited");
            }
        }
        Some(tick)
    }

    /// One clock tick. Does nothing and returns `None` while stopped.
    pub fn tick(&mut self) -> Option<TickDelta> {
        self.settle()
    }

    /// Apply a status change to one question.
    ///
    /// Activation pauses any other active question and links the clock to
    /// `id`; any other status unlinks it. Requests against an unknown or
    /// completed question, or after the session finished, are ignored.
    pub fn request_status_change(&mut self, id: QuestionId, status: QuestionStatus) -> Transition {
        if self.finished {
            debug!("ignoring {status} for {id}: session finished");
            return Transition::Ignored(IgnoreReason::SessionFinished);
        }

        self.settle();
        let transition = self.registry.set_status(id, status);
        if transition.is_applied() {
            if status == QuestionStatus::Active {
                self.clock.link(id);
            } else {
                self.clock.unlink(id);
            }
        }
        transition
    }

    pub fn pause_global_clock(&mut self) {
        if self.clock.is_paused() {
            return;
        }
        self.settle();
        self.clock.pause(self.time_source.now());
        info!("clock paused at {} ms remaining", self.clock.remaining_ms());
    }

    pub fn resume_global_clock(&mut self) {
        if self.finished || !self.clock.is_paused() {
            return;
        }
        self.clock.resume(self.time_source.now());
        info!("clock resumed at {} ms remaining", self.clock.remaining_ms());
    }

    pub fn toggle_global_clock(&mut self) {
        if self.clock.is_paused() {
            self.resume_global_clock();
        } else {
            self.pause_global_clock();
        }
    }

    /// The session view became visible again
    pub fn enter_view(&mut self) {
        if self.finished {
            return;
        }
        self.clock.set_view_active(true, self.time_source.now());
    }

    /// The session view was torn down; the clock stops until re-entered
    pub fn leave_view(&mut self) {
        self.settle();
        self.clock.set_view_active(false, self.time_source.now());
    }

    /// Freeze the clock and make the registry read-only. Statuses are kept.
    pub fn finish_session(&mut self) {
        if self.finished {
            return;
        }
        self.settle();
        self.clock.pause(self.time_source.now());
        self.finished = true;
        info!(
            "session finished: {} ms remaining of {} ms",
            self.clock.remaining_ms(),
            self.clock.total_allocated_ms()
        );
    }

    pub fn records(&self) -> &[QuestionRecord] {
        self.registry.records()
    }

    pub fn record(&self, id: QuestionId) -> Option<&QuestionRecord> {
        self.registry.get(id)
    }

    pub fn question_count(&self) -> usize {
        self.registry.len()
    }

    pub fn next_unfinished_after(&self, id: QuestionId) -> Option<QuestionId> {
        self.registry.next_unfinished_after(id)
    }

    pub fn remaining_ms(&self) -> i64 {
        self.clock.remaining_ms()
    }

    pub fn total_allocated_ms(&self) -> i64 {
        self.clock.total_allocated_ms()
    }

    pub fn active_question_id(&self) -> Option<QuestionId> {
        self.clock.active_question_id()
    }

    pub fn is_paused(&self) -> bool {
        self.clock.is_paused()
    }

    pub fn is_running(&self) -> bool {
        self.clock.is_running()
    }

    pub fn is_overtime(&self) -> bool {
        self.clock.is_overtime()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn started_at(&self) -> DateTime<Local> {
        self.started_at
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            records: self.registry.records().to_vec(),
            total_allocated_ms: self.clock.total_allocated_ms(),
            remaining_ms: self.clock.remaining_ms(),
            config: self.config.clone(),
            started_at: self.started_at,
        }
    }
}
