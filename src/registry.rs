use log::debug;

use crate::question::{QuestionId, QuestionRecord, QuestionStatus};

/// Why a status change request left the registry untouched
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum_macros::Display)]
pub enum IgnoreReason {
    #[strum(serialize = "no such question")]
    UnknownQuestion,
    #[strum(serialize = "already completed")]
    AlreadyCompleted,
    #[strum(serialize = "session is finished")]
    SessionFinished,
}

/// Result of a status change request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied {
        from: QuestionStatus,
        to: QuestionStatus,
        /// Previously active record that was paused to make room
        demoted: Option<QuestionId>,
    },
    Ignored(IgnoreReason),
}

impl Transition {
    pub fn is_applied(&self) -> bool {
        matches!(self, Transition::Applied { .. })
    }
}

/// Ordered collection of the session's question records.
///
/// Ids are assigned sequentially from 1 and double as 1-based positions.
#[derive(Debug, Clone)]
pub struct QuestionRegistry {
    records: Vec<QuestionRecord>,
}

impl QuestionRegistry {
    pub fn new(question_count: usize) -> Self {
        let records = (1..=question_count as u32)
            .map(|n| QuestionRecord::new(QuestionId(n)))
            .collect();
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[QuestionRecord] {
        &self.records
    }

    fn index_of(&self, id: QuestionId) -> Option<usize> {
        let idx = (id.0 as usize).checked_sub(1)?;
        (idx < self.records.len()).then_some(idx)
    }

    pub fn get(&self, id: QuestionId) -> Option<&QuestionRecord> {
        self.index_of(id).map(|idx| &self.records[idx])
    }

    /// The record currently marked active, if any
    pub fn active(&self) -> Option<&QuestionRecord> {
        self.records.iter().find(|r| r.is_active())
    }

    /// Apply a status change.
    ///
    /// Activation is atomic: any other active record is moved to `Paused`
    /// in the same call. Completed records are terminal and unknown ids are
    /// ignored. `time_spent_ms` is never modified here.
    pub fn set_status(&mut self, id: QuestionId, status: QuestionStatus) -> Transition {
        let Some(idx) = self.index_of(id) else {
            debug!("ignoring {status} for unknown question {id}");
            return Transition::Ignored(IgnoreReason::UnknownQuestion);
        };

        let from = self.records[idx].status;
        if from.is_terminal() {
            debug!("ignoring {status} for completed question {id}");
            return Transition::Ignored(IgnoreReason::AlreadyCompleted);
        }

        let mut demoted = None;
        if status == QuestionStatus::Active {
            for other in self.records.iter_mut().filter(|r| r.id != id && r.is_active()) {
                other.status = QuestionStatus::Paused;
                demoted = Some(other.id);
            }
        }

        let record = &mut self.records[idx];
        record.status = status;
        if status == QuestionStatus::Skipped {
            record.was_skipped = true;
        }

        debug!("{id}: {from} -> {status}");
        Transition::Applied {
            from,
            to: status,
            demoted,
        }
    }

    /// Add elapsed time to a record, only if it is currently active.
    /// Returns whether anything was credited.
    pub fn credit(&mut self, id: QuestionId, delta_ms: u64) -> bool {
        match self.index_of(id) {
            Some(idx) if self.records[idx].is_active() => {
                let record = &mut self.records[idx];
                record.time_spent_ms = record.time_spent_ms.saturating_add(delta_ms);
                true
            }
            _ => false,
        }
    }

    /// First record after `id` (wrapping around) that is not completed
    pub fn next_unfinished_after(&self, id: QuestionId) -> Option<QuestionId> {
        let start = self.index_of(id)?;
        let n = self.records.len();
        (1..n)
            .map(|offset| &self.records[(start + offset) % n])
            .find(|r| !r.status.is_terminal())
            .map(|r| r.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn active_count(registry: &QuestionRegistry) -> usize {
        registry.records().iter().filter(|r| r.is_active()).count()
    }

    #[test]
    fn test_new_registry_assigns_sequential_ids() {
        let registry = QuestionRegistry::new(3);

        let ids: Vec<u32> = registry.records().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert!(registry
            .records()
            .iter()
            .all(|r| r.status == QuestionStatus::NotStarted));
    }

    #[test]
    fn test_get_out_of_range() {
        let registry = QuestionRegistry::new(2);

        assert!(registry.get(QuestionId(0)).is_none());
        assert!(registry.get(QuestionId(3)).is_none());
        assert!(registry.get(QuestionId(2)).is_some());
    }

    #[test]
    fn test_activation_demotes_previous_active() {
        let mut registry = QuestionRegistry::new(3);

        registry.set_status(QuestionId(1), QuestionStatus::Active);
        let t = registry.set_status(QuestionId(2), QuestionStatus::Active);

        assert_matches!(
            t,
            Transition::Applied {
                from: QuestionStatus::NotStarted,
                to: QuestionStatus::Active,
                demoted: Some(QuestionId(1)),
            }
        );
        assert_eq!(
            registry.get(QuestionId(1)).unwrap().status,
            QuestionStatus::Paused
        );
        assert_eq!(active_count(&registry), 1);
    }

    #[test]
    fn test_reactivating_same_question_demotes_nothing() {
        let mut registry = QuestionRegistry::new(2);

        registry.set_status(QuestionId(1), QuestionStatus::Active);
        let t = registry.set_status(QuestionId(1), QuestionStatus::Active);

        assert_matches!(t, Transition::Applied { demoted: None, .. });
        assert_eq!(active_count(&registry), 1);
    }

    #[test]
    fn test_skip_sets_was_skipped_for_good() {
        let mut registry = QuestionRegistry::new(1);
        let id = QuestionId(1);

        registry.set_status(id, QuestionStatus::Active);
        registry.set_status(id, QuestionStatus::Skipped);
        assert!(registry.get(id).unwrap().was_skipped);

        registry.set_status(id, QuestionStatus::Active);
        registry.set_status(id, QuestionStatus::Paused);
        registry.set_status(id, QuestionStatus::Completed);

        let record = registry.get(id).unwrap();
        assert!(record.was_skipped);
        assert!(record.completed_after_skip());
    }

    #[test]
    fn test_completed_is_terminal() {
        let mut registry = QuestionRegistry::new(1);
        let id = QuestionId(1);

        registry.set_status(id, QuestionStatus::Active);
        registry.set_status(id, QuestionStatus::Completed);

        assert_eq!(
            registry.set_status(id, QuestionStatus::Active),
            Transition::Ignored(IgnoreReason::AlreadyCompleted)
        );
        assert_eq!(
            registry.set_status(id, QuestionStatus::Completed),
            Transition::Ignored(IgnoreReason::AlreadyCompleted)
        );
        assert_eq!(registry.get(id).unwrap().status, QuestionStatus::Completed);
    }

    #[test]
    fn test_unknown_id_is_ignored() {
        let mut registry = QuestionRegistry::new(2);

        assert_eq!(
            registry.set_status(QuestionId(7), QuestionStatus::Active),
            Transition::Ignored(IgnoreReason::UnknownQuestion)
        );
        assert_eq!(active_count(&registry), 0);
    }

    #[test]
    fn test_ignore_reason_display() {
        assert_eq!(IgnoreReason::UnknownQuestion.to_string(), "no such question");
        assert_eq!(IgnoreReason::AlreadyCompleted.to_string(), "already completed");
        assert_eq!(IgnoreReason::SessionFinished.to_string(), "session is finished");
    }

    #[test]
    fn test_credit_only_applies_to_active_records() {
        let mut registry = QuestionRegistry::new(2);

        assert!(!registry.credit(QuestionId(1), 100));

        registry.set_status(QuestionId(1), QuestionStatus::Active);
        assert!(registry.credit(QuestionId(1), 100));
        assert!(!registry.credit(QuestionId(2), 100));

        registry.set_status(QuestionId(1), QuestionStatus::Skipped);
        assert!(!registry.credit(QuestionId(1), 100));

        assert_eq!(registry.get(QuestionId(1)).unwrap().time_spent_ms, 100);
        assert_eq!(registry.get(QuestionId(2)).unwrap().time_spent_ms, 0);
    }

    #[test]
    fn test_transitions_do_not_touch_time() {
        let mut registry = QuestionRegistry::new(1);
        let id = QuestionId(1);

        registry.set_status(id, QuestionStatus::Active);
        registry.credit(id, 250);
        for status in [
            QuestionStatus::Paused,
            QuestionStatus::Active,
            QuestionStatus::Skipped,
            QuestionStatus::Completed,
        ] {
            registry.set_status(id, status);
            assert_eq!(registry.get(id).unwrap().time_spent_ms, 250);
        }
    }

    #[test]
    fn test_next_unfinished_after_wraps() {
        let mut registry = QuestionRegistry::new(3);
        registry.set_status(QuestionId(1), QuestionStatus::Active);
        registry.set_status(QuestionId(1), QuestionStatus::Completed);
        registry.set_status(QuestionId(3), QuestionStatus::Active);
        registry.set_status(QuestionId(3), QuestionStatus::Completed);

        assert_eq!(
            registry.next_unfinished_after(QuestionId(3)),
            Some(QuestionId(2))
        );

        registry.set_status(QuestionId(2), QuestionStatus::Active);
        registry.set_status(QuestionId(2), QuestionStatus::Completed);
        assert_eq!(registry.next_unfinished_after(QuestionId(2)), None);
    }
}
