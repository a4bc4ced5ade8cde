//! Process-wide activity audit trail.
//!
//! Any component may [`record`](ActivityLog::record) an entry. Reads return
//! entries sorted by their semantic `date` (newest first); `recorded_at` is
//! the wall-clock time of the write and never drives ordering. Entries with
//! equal dates keep their write order.

use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActivityEntry {
    pub id: String,
    pub report_id: String,
    pub description: String,
    /// Date shown to users and used for ordering.
    #[serde(rename = "fecha")]
    pub date: DateTime<Utc>,
    /// When the entry was written.
    #[serde(rename = "fechaHora")]
    pub recorded_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<ActivityDetails>,
}

/// Caller-supplied fields of a new activity entry.
#[derive(Debug, Clone)]
pub struct ActivityEntryInput {
    pub report_id: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub details: Option<ActivityDetails>,
}

impl ActivityEntryInput {
    /// Input dated now, without details.
    #[must_use]
    pub fn now(report_id: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            report_id: report_id.into(),
            description: description.into(),
            date: Utc::now(),
            details: None,
        }
    }

    #[must_use]
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.details = Some(ActivityDetails {
            comment: Some(comment.into()),
        });
        self
    }
}

#[derive(Debug, Default)]
pub struct ActivityLog {
    entries: RwLock<Vec<ActivityEntry>>,
}

impl ActivityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: Vec<ActivityEntry>) -> Self {
        Self {
            entries: RwLock::new(entries),
        }
    }

    /// Append an entry with a fresh `act-` id, timestamped now.
    pub fn record(&self, input: ActivityEntryInput) -> ActivityEntry {
        let entry = ActivityEntry {
            id: id::next_id(id::ACTIVITY_PREFIX),
            report_id: input.report_id,
            description: input.description,
            date: input.date,
            recorded_at: Utc::now(),
            details: input.details,
        };
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(entry.clone());
        tracing::debug!(entry_id = %entry.id, report_id = %entry.report_id, "activity recorded");
        entry
    }

    /// Entries for one report, newest `date` first.
    #[must_use]
    pub fn by_report(&self, report_id: &str) -> Vec<ActivityEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut matching: Vec<ActivityEntry> = entries
            .iter()
            .filter(|entry| entry.report_id == report_id)
            .cloned()
            .collect();
        drop(entries);
        sort_newest_first(&mut matching);
        matching
    }

    /// Every entry, newest `date` first.
    #[must_use]
    pub fn all(&self) -> Vec<ActivityEntry> {
        let mut all = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        sort_newest_first(&mut all);
        all
    }

    /// The `limit` newest entries across all reports.
    #[must_use]
    pub fn recent(&self, limit: usize) -> Vec<ActivityEntry> {
        let mut all = self.all();
        all.truncate(limit);
        all
    }

    /// Remove every entry for a report. Returns how many were removed.
    pub fn delete_by_report(&self, report_id: &str) -> usize {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        let before = entries.len();
        entries.retain(|entry| entry.report_id != report_id);
        before - entries.len()
    }

    /// Entries in write order, for snapshots.
    #[must_use]
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn reset(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

// `sort_by` is stable, so equal dates keep write order.
fn sort_newest_first(entries: &mut [ActivityEntry]) {
    entries.sort_by(|a, b| b.date.cmp(&a.date));
}
