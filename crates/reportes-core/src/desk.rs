//! `ReportDesk`: the components wired together for one dashboard.
//!
//! The desk owns the shared collections (assignment ledgers, state history,
//! activity log), hands the store and notifier to the transition service,
//! and implements the operations that touch several collections at once:
//! guarded assignment and cascade deletion.
//!
//! A desk can be rebuilt from a [`DeskSnapshot`], the JSON document the CLI
//! keeps on disk in place of a database.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::activity::{ActivityEntry, ActivityEntryInput, ActivityLog};
use crate::assignment::{AssignError, Assignment, AssignmentTracker, ensure_reassignable};
use crate::config::ProjectConfig;
use crate::ledger::HistoryLedger;
use crate::lock::ReportLocks;
use crate::model::{Report, ReportState, StateKind, UserRef};
use crate::notify::Notifier;
use crate::state_history::{StateHistory, StateHistoryEntry};
use crate::store::{InMemoryReportStore, ReportStore, StoreError};
use crate::summary::DashboardSummary;
use crate::transition::{StateTransitionService, TransitionOutcome};

/// Serializable image of every collection a desk holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeskSnapshot {
    #[serde(default)]
    pub users: Vec<UserRef>,
    #[serde(default)]
    pub states: Vec<ReportState>,
    #[serde(default)]
    pub reports: Vec<Report>,
    #[serde(default)]
    pub assignments: BTreeMap<String, HistoryLedger<Assignment>>,
    #[serde(default)]
    pub state_history: Vec<StateHistoryEntry>,
    #[serde(default)]
    pub activity: Vec<ActivityEntry>,
}

impl DeskSnapshot {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let json = serde_json::to_string_pretty(self).context("Failed to serialize snapshot")?;
        std::fs::write(path, json + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

/// What a cascade delete removed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeletedReport {
    pub report: Option<Report>,
    pub activity_removed: usize,
    pub assignments_removed: usize,
    pub state_history_removed: usize,
}

pub struct ReportDesk {
    store: Arc<dyn ReportStore>,
    users: Vec<UserRef>,
    states: Vec<ReportState>,
    assignments: Arc<AssignmentTracker>,
    state_history: Arc<StateHistory>,
    activity: Arc<ActivityLog>,
    locks: Arc<ReportLocks>,
    transitions: StateTransitionService,
    config: ProjectConfig,
}

impl ReportDesk {
    /// A desk with empty collections over `store`.
    #[must_use]
    pub fn new(
        store: Arc<dyn ReportStore>,
        notifier: Arc<dyn Notifier>,
        config: ProjectConfig,
    ) -> Self {
        Self::assemble(
            store,
            notifier,
            config,
            Vec::new(),
            Vec::new(),
            AssignmentTracker::new(),
            StateHistory::new(),
            ActivityLog::new(),
        )
    }

    /// A desk backed by an in-memory store seeded from `snapshot`.
    #[must_use]
    pub fn from_snapshot(
        snapshot: DeskSnapshot,
        notifier: Arc<dyn Notifier>,
        config: ProjectConfig,
    ) -> Self {
        let store = Arc::new(InMemoryReportStore::with_reports(snapshot.reports));
        Self::assemble(
            store,
            notifier,
            config,
            snapshot.users,
            snapshot.states,
            AssignmentTracker::from_ledgers(snapshot.assignments.into_iter().collect()),
            StateHistory::from_entries(snapshot.state_history),
            ActivityLog::from_entries(snapshot.activity),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn assemble(
        store: Arc<dyn ReportStore>,
        notifier: Arc<dyn Notifier>,
        config: ProjectConfig,
        users: Vec<UserRef>,
        states: Vec<ReportState>,
        assignments: AssignmentTracker,
        state_history: StateHistory,
        activity: ActivityLog,
    ) -> Self {
        let state_history = Arc::new(state_history);
        let activity = Arc::new(activity);
        let locks = Arc::new(ReportLocks::new());
        let transitions = StateTransitionService::new(
            Arc::clone(&store),
            Arc::clone(&state_history),
            Arc::clone(&activity),
            notifier,
        )
        .with_config(config.transitions.clone())
        .with_locks(Arc::clone(&locks));

        Self {
            store,
            users,
            states,
            assignments: Arc::new(assignments),
            state_history,
            activity,
            locks,
            transitions,
            config,
        }
    }

    #[must_use]
    pub fn assignments(&self) -> &AssignmentTracker {
        &self.assignments
    }

    #[must_use]
    pub fn state_history(&self) -> &StateHistory {
        &self.state_history
    }

    #[must_use]
    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    #[must_use]
    pub fn users(&self) -> &[UserRef] {
        &self.users
    }

    #[must_use]
    pub fn find_user(&self, id: &str) -> Option<&UserRef> {
        self.users.iter().find(|user| user.id == id)
    }

    /// Resolve a state by configured id or name, falling back to the
    /// canonical state of a known kind identifier.
    #[must_use]
    pub fn find_state(&self, raw: &str) -> Option<ReportState> {
        self.states
            .iter()
            .find(|state| state.id == raw || state.name.eq_ignore_ascii_case(raw))
            .cloned()
            .or_else(|| raw.parse::<StateKind>().ok().map(ReportState::from_kind))
    }

    pub async fn report(&self, id: &str) -> Result<Option<Report>, StoreError> {
        self.store.get_report(id).await
    }

    /// Run a state transition. See [`StateTransitionService`].
    pub async fn transition(
        &self,
        report: &Report,
        new_state: ReportState,
        actor: &UserRef,
        comment: &str,
    ) -> TransitionOutcome {
        self.transitions
            .transition_with_comment(report, new_state, actor, comment)
            .await
    }

    /// Assign (or with `None`, unassign) a report, refusing when the current
    /// assignee is blocked. Records an activity entry on success.
    ///
    /// The assignee's status is read from the user directory; the copy kept
    /// in the ledger is only used for users the directory no longer knows.
    ///
    /// # Errors
    ///
    /// Returns [`AssignError::AssigneeBlocked`] without touching the ledger.
    pub fn assign(
        &self,
        report: &Report,
        user: Option<UserRef>,
        actor: &UserRef,
    ) -> Result<HistoryLedger<Assignment>, AssignError> {
        let current = self
            .assignments
            .current_assignment(&report.id)
            .map(|mut entry| {
                if let Some(assignee) = entry.payload.assigned_user.as_mut() {
                    if let Some(known) = self.find_user(&assignee.id) {
                        *assignee = known.clone();
                    }
                }
                entry
            });
        ensure_reassignable(&report.id, current.as_ref())?;

        let description = match &user {
            Some(user) => format!("Assigned to {} by {}", user.full_name(), actor.full_name()),
            None => format!("Unassigned by {}", actor.full_name()),
        };
        let ledger = self.assignments.assign(report, user);
        self.activity
            .record(ActivityEntryInput::now(report.id.clone(), description));
        Ok(ledger)
    }

    /// Delete a report and every history row that belongs to it.
    ///
    /// The cascade runs even when the store no longer has the report, so
    /// orphaned rows are cleaned up as well.
    pub async fn delete_report(&self, id: &str) -> Result<DeletedReport, StoreError> {
        let guard = self.locks.acquire(id).await;
        let report = self.store.remove_report(id).await?;

        let deleted = DeletedReport {
            report,
            activity_removed: self.activity.delete_by_report(id),
            assignments_removed: self.assignments.delete_report(id),
            state_history_removed: self.state_history.delete_report(id),
        };
        drop(guard);
        self.locks.forget(id);

        tracing::info!(
            report_id = id,
            existed = deleted.report.is_some(),
            activity = deleted.activity_removed,
            assignments = deleted.assignments_removed,
            state_history = deleted.state_history_removed,
            "report deleted"
        );
        Ok(deleted)
    }

    pub async fn summary(&self) -> Result<DashboardSummary, StoreError> {
        let reports = self.store.list_reports().await?;
        Ok(DashboardSummary::derive(
            &reports,
            &self.assignments,
            &self.activity,
            self.config.activity.feed_limit,
        ))
    }

    pub async fn snapshot(&self) -> Result<DeskSnapshot, StoreError> {
        Ok(DeskSnapshot {
            users: self.users.clone(),
            states: self.states.clone(),
            reports: self.store.list_reports().await?,
            assignments: self.assignments.ledgers().into_iter().collect(),
            state_history: self.state_history.all(),
            activity: self.activity.entries(),
        })
    }

    /// Empty every history collection. The store is left alone.
    pub fn reset_history(&self) {
        self.assignments.reset();
        self.state_history.reset();
        self.activity.reset();
    }
}
