use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crate::question::QuestionId;

/// Source of monotonic instants for the session clock
pub trait TimeSource {
    fn now(&self) -> Instant;
}

/// Production time source backed by `Instant::now`
#[derive(Clone, Copy, Debug, Default)]
pub struct MonotonicTimeSource;

impl TimeSource for MonotonicTimeSource {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Hand-driven time source for tests and headless runs.
/// Clones share the same current instant.
#[derive(Clone, Debug)]
pub struct ManualTimeSource {
    now: Rc<Cell<Instant>>,
}

impl ManualTimeSource {
    pub fn new() -> Self {
        Self {
            now: Rc::new(Cell::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Default for ManualTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for ManualTimeSource {
    fn now(&self) -> Instant {
        self.now.get()
    }
}

/// Outcome of one clock advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickDelta {
    pub delta_ms: u64,
    /// Question linked to the clock while the delta elapsed
    pub linked: Option<QuestionId>,
}

/// Global countdown plus the link to the question accruing time.
///
/// The clock runs only while the view is active and it is not paused. While
/// running, `last_tick` marks the start of the interval not yet accounted
/// for; it is cleared whenever the clock stops so no stale interval can be
/// credited after a restart.
#[derive(Debug, Clone)]
pub struct SessionClock {
    remaining_ms: i64,
    total_allocated_ms: i64,
    is_paused: bool,
    view_active: bool,
    active_question_id: Option<QuestionId>,
    last_tick: Option<Instant>,
}

impl SessionClock {
    pub fn new(total_allocated_ms: i64) -> Self {
        Self {
            remaining_ms: total_allocated_ms,
            total_allocated_ms,
            is_paused: false,
            view_active: false,
            active_question_id: None,
            last_tick: None,
        }
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    pub fn total_allocated_ms(&self) -> i64 {
        self.total_allocated_ms
    }

    pub fn is_paused(&self) -> bool {
        self.is_paused
    }

    pub fn is_view_active(&self) -> bool {
        self.view_active
    }

    pub fn is_running(&self) -> bool {
        self.view_active && !self.is_paused
    }

    pub fn is_overtime(&self) -> bool {
        self.remaining_ms < 0
    }

    pub fn active_question_id(&self) -> Option<QuestionId> {
        self.active_question_id
    }

    fn sync_running(&mut self, now: Instant) {
        if self.is_running() {
            if self.last_tick.is_none() {
                self.last_tick = Some(now);
            }
        } else {
            self.last_tick = None;
        }
    }

    pub fn set_view_active(&mut self, active: bool, now: Instant) {
        self.view_active = active;
        self.sync_running(now);
    }

    pub fn pause(&mut self, now: Instant) {
        self.is_paused = true;
        self.sync_running(now);
    }

    pub fn resume(&mut self, now: Instant) {
        self.is_paused = false;
        self.sync_running(now);
    }

    /// Measure the time since the previous tick and take it off the budget.
    ///
    /// Whole milliseconds are consumed and `last_tick` moves forward by
    /// exactly that amount, so the sub-millisecond remainder is carried into
    /// the next tick. Returns `None` while stopped.
    pub fn advance(&mut self, now: Instant) -> Option<TickDelta> {
        let last = self.last_tick?;
        let delta_ms = now.saturating_duration_since(last).as_millis() as u64;
        self.last_tick = Some(last + Duration::from_millis(delta_ms));
        self.remaining_ms -= delta_ms as i64;

        Some(TickDelta {
            delta_ms,
            linked: self.active_question_id,
        })
    }

    pub fn link(&mut self, id: QuestionId) {
        self.active_question_id = Some(id);
    }

    /// Drop the link if it points at `id`
    pub fn unlink(&mut self, id: QuestionId) {
        if self.active_question_id == Some(id) {
            self.active_question_id = None;
        }
    }
}
