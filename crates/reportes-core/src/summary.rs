//! Dashboard aggregates derived from reports, assignments and activity.
//!
//! Derivation is a pure read: it never writes to any collection, so deriving
//! twice from unchanged inputs yields equal summaries.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::activity::{ActivityEntry, ActivityLog};
use crate::assignment::AssignmentTracker;
use crate::model::{Report, StateKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AssigneeCount {
    pub user_id: String,
    pub name: String,
    pub reports: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub total_reports: usize,
    /// Every state kind, including those with zero reports.
    pub by_state: BTreeMap<StateKind, usize>,
    /// Sorted by report count (descending), then user id.
    pub by_assignee: Vec<AssigneeCount>,
    pub unassigned: usize,
    pub recent_activity: Vec<ActivityEntry>,
}

impl DashboardSummary {
    #[must_use]
    pub fn derive(
        reports: &[Report],
        assignments: &AssignmentTracker,
        activity: &ActivityLog,
        feed_limit: usize,
    ) -> Self {
        let mut by_state: BTreeMap<StateKind, usize> =
            StateKind::ALL.iter().map(|kind| (*kind, 0)).collect();
        let mut assignees: BTreeMap<String, AssigneeCount> = BTreeMap::new();
        let mut unassigned = 0;

        for report in reports {
            *by_state.entry(report.current_state.kind).or_default() += 1;

            match assignments.current_assignee(&report.id) {
                Some(user) => {
                    assignees
                        .entry(user.id.clone())
                        .or_insert_with(|| AssigneeCount {
                            user_id: user.id.clone(),
                            name: user.full_name(),
                            reports: 0,
                        })
                        .reports += 1;
                }
                None => unassigned += 1,
            }
        }

        let mut by_assignee: Vec<AssigneeCount> = assignees.into_values().collect();
        by_assignee.sort_by(|a, b| {
            b.reports
                .cmp(&a.reports)
                .then_with(|| a.user_id.cmp(&b.user_id))
        });

        Self {
            total_reports: reports.len(),
            by_state,
            by_assignee,
            unassigned,
            recent_activity: activity.recent(feed_limit),
        }
    }
}
