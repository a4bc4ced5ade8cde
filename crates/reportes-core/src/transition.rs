//! Report state transitions.
//!
//! [`StateTransitionService::transition`] moves a report to a new state in
//! two steps:
//!
//! 1. write a [`StateHistoryEntry`] (`cambio_estado`) capturing the old and
//!    new state names and the actor;
//! 2. patch the report's `current_state` through the [`ReportStore`].
//!
//! The service never returns `Err` and never panics on store failures. The
//! result is a [`TransitionOutcome`], and exactly one [`Notification`] is
//! emitted per call (success or error).
//!
//! # Partial writes
//!
//! If step 2 fails (the store errors, or reports the id as missing) the
//! history entry from step 1 is kept: history may record a transition the
//! report never reflects. The outcome flags this as a partial write. With
//! `compensate_partial_writes` enabled, a `reversion` entry (to → from) is
//! appended so that replaying the history ends at the report's real state.
//! History entries are never deleted.

use std::sync::Arc;

use crate::activity::{ActivityEntryInput, ActivityLog};
use crate::config::TransitionConfig;
use crate::error::ErrorCode;
use crate::lock::ReportLocks;
use crate::model::{Report, ReportPatch, ReportState, UserRef};
use crate::notify::{Notification, Notifier};
use crate::state_history::{
    ChangeType, HistoryWriteError, NewStateHistoryEntry, StateHistory, StateHistoryEntry,
};
use crate::store::{ReportStore, StoreError};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// The store has no report with this id.
    #[error("{}: report {report_id} not found", ErrorCode::ReportNotFound)]
    NotFound { report_id: String },

    /// The store could not apply the patch.
    #[error("{}: {source}", ErrorCode::PersistenceFailure)]
    Persistence {
        #[from]
        source: StoreError,
    },

    /// The state history entry could not be written; the store was not touched.
    #[error("{}: {source}", ErrorCode::HistoryWriteFailed)]
    HistoryWrite {
        #[from]
        source: HistoryWriteError,
    },
}

impl TransitionError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::ReportNotFound,
            Self::Persistence { .. } => ErrorCode::PersistenceFailure,
            Self::HistoryWrite { .. } => ErrorCode::HistoryWriteFailed,
        }
    }
}

/// Result of a transition attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum TransitionOutcome {
    /// History written and report updated.
    Applied {
        report: Report,
        entry: StateHistoryEntry,
    },
    /// The report was not updated.
    Failed {
        error: TransitionError,
        /// History entry written before the failure, if step 1 succeeded.
        entry: Option<StateHistoryEntry>,
        /// Compensating `reversion` entry, when compensation is enabled.
        compensation: Option<StateHistoryEntry>,
    },
}

impl TransitionOutcome {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Applied { .. })
    }

    /// True when history recorded a change the report does not reflect.
    #[must_use]
    pub const fn is_partial_write(&self) -> bool {
        matches!(self, Self::Failed { entry: Some(_), .. })
    }

    #[must_use]
    pub const fn error(&self) -> Option<&TransitionError> {
        match self {
            Self::Applied { .. } => None,
            Self::Failed { error, .. } => Some(error),
        }
    }

    /// The state history entry written by this attempt, if any.
    #[must_use]
    pub const fn entry(&self) -> Option<&StateHistoryEntry> {
        match self {
            Self::Applied { entry, .. } => Some(entry),
            Self::Failed { entry, .. } => entry.as_ref(),
        }
    }

    /// The most specific code for a failed outcome.
    #[must_use]
    pub const fn code(&self) -> Option<ErrorCode> {
        match self {
            Self::Applied { .. } => None,
            Self::Failed { entry: Some(_), .. } => Some(ErrorCode::PartialWrite),
            Self::Failed { error, .. } => Some(error.code()),
        }
    }
}

pub struct StateTransitionService {
    store: Arc<dyn ReportStore>,
    history: Arc<StateHistory>,
    activity: Arc<ActivityLog>,
    notifier: Arc<dyn Notifier>,
    locks: Arc<ReportLocks>,
    config: TransitionConfig,
}

impl StateTransitionService {
    #[must_use]
    pub fn new(
        store: Arc<dyn ReportStore>,
        history: Arc<StateHistory>,
        activity: Arc<ActivityLog>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            history,
            activity,
            notifier,
            locks: Arc::new(ReportLocks::new()),
            config: TransitionConfig::default(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: TransitionConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a lock registry with other writers of the same reports.
    #[must_use]
    pub fn with_locks(mut self, locks: Arc<ReportLocks>) -> Self {
        self.locks = locks;
        self
    }

    /// Move `report` to `new_state` on behalf of `actor`.
    pub async fn transition(
        &self,
        report: &Report,
        new_state: ReportState,
        actor: &UserRef,
    ) -> TransitionOutcome {
        self.transition_with_comment(report, new_state, actor, "")
            .await
    }

    /// Like [`transition`](Self::transition), storing `comment` on the
    /// history entry and the activity entry.
    pub async fn transition_with_comment(
        &self,
        report: &Report,
        new_state: ReportState,
        actor: &UserRef,
        comment: &str,
    ) -> TransitionOutcome {
        let _guard = if self.config.serialize_per_report {
            Some(self.locks.acquire(&report.id).await)
        } else {
            None
        };

        let outcome = self.apply(report, new_state, actor, comment).await;

        match &outcome {
            TransitionOutcome::Applied { report, entry } => {
                tracing::info!(
                    report_id = %report.id,
                    from = %entry.from_state_name,
                    to = %entry.to_state_name,
                    actor = %actor.id,
                    "report state changed"
                );
                self.notifier.notify(Notification::success(format!(
                    "Report {} moved to {}",
                    report.id, entry.to_state_name
                )));
            }
            TransitionOutcome::Failed { error, .. } => {
                tracing::error!(
                    report_id = %report.id,
                    code = %error.code(),
                    partial_write = outcome.is_partial_write(),
                    "transition failed: {error}"
                );
                self.notifier.notify(Notification::error(format!(
                    "Could not update the state of report {}",
                    report.id
                )));
            }
        }

        outcome
    }

    async fn apply(
        &self,
        report: &Report,
        new_state: ReportState,
        actor: &UserRef,
        comment: &str,
    ) -> TransitionOutcome {
        let entry = match self.history.record(NewStateHistoryEntry {
            report_id: report.id.clone(),
            from_state_name: report.current_state.name.clone(),
            to_state_name: new_state.name.clone(),
            actor: actor.clone(),
            comment: comment.to_string(),
            change_type: ChangeType::StateChange,
        }) {
            Ok(entry) => entry,
            Err(err) => {
                return TransitionOutcome::Failed {
                    error: err.into(),
                    entry: None,
                    compensation: None,
                };
            }
        };

        let error = match self
            .store
            .update_report(&report.id, ReportPatch::state(new_state))
            .await
        {
            Ok(Some(updated)) => {
                self.record_activity(&entry);
                return TransitionOutcome::Applied {
                    report: updated,
                    entry,
                };
            }
            Ok(None) => TransitionError::NotFound {
                report_id: report.id.clone(),
            },
            Err(err) => err.into(),
        };

        let compensation = if self.config.compensate_partial_writes {
            self.compensate(&entry)
        } else {
            None
        };

        TransitionOutcome::Failed {
            error,
            entry: Some(entry),
            compensation,
        }
    }

    fn record_activity(&self, entry: &StateHistoryEntry) {
        let mut input = ActivityEntryInput::now(
            entry.report_id.clone(),
            format!(
                "State changed from {} to {} by {}",
                entry.from_state_name,
                entry.to_state_name,
                entry.actor.full_name()
            ),
        );
        input.date = entry.timestamp;
        if !entry.comment.is_empty() {
            input = input.with_comment(entry.comment.clone());
        }
        self.activity.record(input);
    }

    fn compensate(&self, entry: &StateHistoryEntry) -> Option<StateHistoryEntry> {
        let reversion = NewStateHistoryEntry {
            report_id: entry.report_id.clone(),
            from_state_name: entry.to_state_name.clone(),
            to_state_name: entry.from_state_name.clone(),
            actor: entry.actor.clone(),
            comment: format!("reverts {}", entry.id),
            change_type: ChangeType::Reversion,
        };
        match self.history.record(reversion) {
            Ok(compensation) => Some(compensation),
            Err(err) => {
                tracing::warn!(entry_id = %entry.id, "compensation not recorded: {err}");
                None
            }
        }
    }
}
