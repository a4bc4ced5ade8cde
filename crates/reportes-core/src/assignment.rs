//! Assignment history per report.
//!
//! Every assign or unassign action appends an entry to the report's
//! [`HistoryLedger<Assignment>`]; the current entry is the report's current
//! assignee. An unassignment is an entry whose `assigned_user` is `None`, so
//! it stays visible in the audit trail.
//!
//! The tracker performs no authorization. Callers that must refuse
//! reassignment away from a blocked user check [`ensure_reassignable`]
//! before calling [`AssignmentTracker::assign`].

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::id;
use crate::ledger::{HistoryEntry, HistoryLedger};
use crate::model::{Report, UserRef};

/// Payload of an assignment history entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    /// The assigned user, or `None` for an explicit unassignment.
    pub assigned_user: Option<UserRef>,
}

pub type AssignmentHistoryEntry = HistoryEntry<Assignment>;

/// Reason an assignment was refused by [`ensure_reassignable`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AssignError {
    #[error("{}: report {report_id} is assigned to blocked user {user_id}", ErrorCode::AssigneeBlocked)]
    AssigneeBlocked { report_id: String, user_id: String },
}

impl AssignError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AssigneeBlocked { .. } => ErrorCode::AssigneeBlocked,
        }
    }
}

/// Reject reassignment of a report whose current assignee is blocked.
///
/// # Errors
///
/// Returns [`AssignError::AssigneeBlocked`] when the current entry names a
/// user with status `bloqueado`.
pub fn ensure_reassignable(
    report_id: &str,
    current: Option<&AssignmentHistoryEntry>,
) -> Result<(), AssignError> {
    match current.and_then(|entry| entry.payload.assigned_user.as_ref()) {
        Some(user) if user.is_blocked() => Err(AssignError::AssigneeBlocked {
            report_id: report_id.to_string(),
            user_id: user.id.clone(),
        }),
        _ => Ok(()),
    }
}

/// Process-wide assignment ledgers keyed by report id.
#[derive(Debug, Default)]
pub struct AssignmentTracker {
    ledgers: RwLock<HashMap<String, HistoryLedger<Assignment>>>,
}

impl AssignmentTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild a tracker from stored ledgers.
    #[must_use]
    pub fn from_ledgers(ledgers: HashMap<String, HistoryLedger<Assignment>>) -> Self {
        Self {
            ledgers: RwLock::new(ledgers),
        }
    }

    /// Record that `user` is now responsible for `report` (`None` unassigns).
    ///
    /// Returns the report's full assignment history after the append.
    pub fn assign(&self, report: &Report, user: Option<UserRef>) -> HistoryLedger<Assignment> {
        let mut ledgers = self.ledgers.write().unwrap_or_else(PoisonError::into_inner);
        let previous = ledgers.get(&report.id).cloned().unwrap_or_default();
        let user_id = user.as_ref().map(|u| u.id.clone());

        let next = previous.append_with_prefix(id::ASSIGNMENT_PREFIX, Assignment {
            assigned_user: user,
        });
        ledgers.insert(report.id.clone(), next.clone());

        tracing::debug!(
            report_id = %report.id,
            assignee = user_id.as_deref().unwrap_or("-"),
            entries = next.len(),
            "assignment recorded"
        );
        next
    }

    /// The current assignment entry for a report.
    #[must_use]
    pub fn current_assignment(&self, report_id: &str) -> Option<AssignmentHistoryEntry> {
        let ledgers = self.ledgers.read().unwrap_or_else(PoisonError::into_inner);
        ledgers
            .get(report_id)
            .and_then(HistoryLedger::current)
            .cloned()
    }

    /// The currently assigned user, if the report is assigned.
    #[must_use]
    pub fn current_assignee(&self, report_id: &str) -> Option<UserRef> {
        self.current_assignment(report_id)
            .and_then(|entry| entry.payload.assigned_user)
    }

    /// Full assignment history for a report, oldest first.
    #[must_use]
    pub fn history(&self, report_id: &str) -> HistoryLedger<Assignment> {
        let ledgers = self.ledgers.read().unwrap_or_else(PoisonError::into_inner);
        ledgers.get(report_id).cloned().unwrap_or_default()
    }

    /// Drop the whole history of a deleted report. Returns the number of
    /// entries removed.
    pub fn delete_report(&self, report_id: &str) -> usize {
        let mut ledgers = self.ledgers.write().unwrap_or_else(PoisonError::into_inner);
        ledgers.remove(report_id).map_or(0, |ledger| ledger.len())
    }

    /// Copy of every ledger, for snapshots.
    #[must_use]
    pub fn ledgers(&self) -> HashMap<String, HistoryLedger<Assignment>> {
        self.ledgers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn reset(&self) {
        self.ledgers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::UserStatus;

    fn report() -> Report {
        Report::new("r-1", "Fuga de agua")
    }

    fn ana() -> UserRef {
        UserRef::new("u-1", "Ana", "Rojas")
    }

    fn luis() -> UserRef {
        UserRef::new("u-2", "Luis", "Mena")
    }

    #[test]
    fn unassigned_report_has_no_current() {
        let tracker = AssignmentTracker::new();
        assert!(tracker.current_assignment("r-1").is_none());
        assert!(tracker.history("r-1").is_empty());
    }

    #[test]
    fn reassign_moves_current_pointer() {
        let tracker = AssignmentTracker::new();
        let r = report();

        tracker.assign(&r, Some(ana()));
        let history = tracker.assign(&r, Some(luis()));

        assert_eq!(history.len(), 2);
        assert!(!history.all()[0].is_current);
        assert_eq!(tracker.current_assignee("r-1"), Some(luis()));
        assert!(history.all()[0].id.starts_with("asg-"));
    }

    #[test]
    fn unassign_is_recorded_as_current_entry() {
        let tracker = AssignmentTracker::new();
        let r = report();

        tracker.assign(&r, Some(ana()));
        tracker.assign(&r, None);

        let current = tracker.current_assignment("r-1").expect("current entry");
        assert!(current.payload.assigned_user.is_none());
        assert!(current.is_current);

        let history = tracker.history("r-1");
        assert!(!history.all()[0].is_current);
        assert_eq!(history.all()[0].payload.assigned_user, Some(ana()));
        assert!(tracker.current_assignee("r-1").is_none());
    }

    #[test]
    fn same_user_twice_creates_two_entries() {
        let tracker = AssignmentTracker::new();
        let r = report();

        tracker.assign(&r, Some(ana()));
        let history = tracker.assign(&r, Some(ana()));

        assert_eq!(history.len(), 2);
        assert_ne!(history.all()[0].id, history.all()[1].id);
    }

    #[test]
    fn ledgers_are_independent_per_report() {
        let tracker = AssignmentTracker::new();
        tracker.assign(&report(), Some(ana()));
        tracker.assign(&Report::new("r-2", "Poste caído"), Some(luis()));

        assert_eq!(tracker.current_assignee("r-1"), Some(ana()));
        assert_eq!(tracker.current_assignee("r-2"), Some(luis()));
    }

    #[test]
    fn delete_report_drops_whole_ledger() {
        let tracker = AssignmentTracker::new();
        let r = report();
        tracker.assign(&r, Some(ana()));
        tracker.assign(&r, None);

        assert_eq!(tracker.delete_report("r-1"), 2);
        assert!(tracker.history("r-1").is_empty());
        assert_eq!(tracker.delete_report("r-1"), 0);
    }

    #[test]
    fn blocked_assignee_refuses_reassignment() {
        let tracker = AssignmentTracker::new();
        let r = report();
        tracker.assign(&r, Some(ana().with_status(UserStatus::Blocked)));

        let current = tracker.current_assignment("r-1");
        let err = ensure_reassignable("r-1", current.as_ref()).unwrap_err();
        assert_eq!(err.code(), ErrorCode::AssigneeBlocked);
        assert!(err.to_string().contains("u-1"));
    }

    #[test]
    fn active_or_missing_assignee_allows_reassignment() {
        let tracker = AssignmentTracker::new();
        let r = report();
        assert!(ensure_reassignable("r-1", None).is_ok());

        tracker.assign(&r, Some(ana().with_status(UserStatus::Inactive)));
        let current = tracker.current_assignment("r-1");
        assert!(ensure_reassignable("r-1", current.as_ref()).is_ok());

        tracker.assign(&r, None);
        let current = tracker.current_assignment("r-1");
        assert!(ensure_reassignable("r-1", current.as_ref()).is_ok());
    }
}
