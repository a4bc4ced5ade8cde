//! Immutable record of state changes, kept as a child collection per report.

use std::collections::HashMap;
use std::fmt;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::id;
use crate::model::UserRef;

/// Kind of change a [`StateHistoryEntry`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChangeType {
    /// A user-initiated move between states.
    #[serde(rename = "cambio_estado")]
    StateChange,
    /// A compensating entry undoing a state change the store never applied.
    #[serde(rename = "reversion")]
    Reversion,
}

impl ChangeType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StateChange => "cambio_estado",
            Self::Reversion => "reversion",
        }
    }
}

impl fmt::Display for ChangeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateHistoryEntry {
    pub id: String,
    pub report_id: String,
    pub from_state_name: String,
    pub to_state_name: String,
    pub actor: UserRef,
    #[serde(default)]
    pub comment: String,
    pub change_type: ChangeType,
    pub timestamp: DateTime<Utc>,
}

/// Fields supplied by the caller; id and timestamp are assigned on write.
#[derive(Debug, Clone)]
pub struct NewStateHistoryEntry {
    pub report_id: String,
    pub from_state_name: String,
    pub to_state_name: String,
    pub actor: UserRef,
    pub comment: String,
    pub change_type: ChangeType,
}

/// Raised when the history collection cannot accept a write.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("state history unavailable: {reason}")]
pub struct HistoryWriteError {
    pub reason: String,
}

/// State history entries grouped by report id, in write order.
#[derive(Debug, Default)]
pub struct StateHistory {
    entries: RwLock<HashMap<String, Vec<StateHistoryEntry>>>,
}

impl StateHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn from_entries(entries: Vec<StateHistoryEntry>) -> Self {
        let mut grouped: HashMap<String, Vec<StateHistoryEntry>> = HashMap::new();
        for entry in entries {
            grouped.entry(entry.report_id.clone()).or_default().push(entry);
        }
        Self {
            entries: RwLock::new(grouped),
        }
    }

    /// Append an entry for its report.
    ///
    /// # Errors
    ///
    /// Returns [`HistoryWriteError`] if a previous writer panicked while
    /// holding the collection, leaving it in an unknown state.
    pub fn record(&self, new: NewStateHistoryEntry) -> Result<StateHistoryEntry, HistoryWriteError> {
        let mut entries = self.entries.write().map_err(|_| HistoryWriteError {
            reason: "collection poisoned by an earlier panic".to_string(),
        })?;

        let entry = StateHistoryEntry {
            id: id::next_id(id::STATE_PREFIX),
            report_id: new.report_id,
            from_state_name: new.from_state_name,
            to_state_name: new.to_state_name,
            actor: new.actor,
            comment: new.comment,
            change_type: new.change_type,
            timestamp: Utc::now(),
        };
        entries
            .entry(entry.report_id.clone())
            .or_default()
            .push(entry.clone());

        tracing::debug!(
            entry_id = %entry.id,
            report_id = %entry.report_id,
            from = %entry.from_state_name,
            to = %entry.to_state_name,
            change_type = %entry.change_type,
            "state history entry written"
        );
        Ok(entry)
    }

    /// Entries for one report, oldest first.
    #[must_use]
    pub fn for_report(&self, report_id: &str) -> Vec<StateHistoryEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(report_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Every entry, grouped by report id (sorted) then write order.
    #[must_use]
    pub fn all(&self) -> Vec<StateHistoryEntry> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        let mut report_ids: Vec<&String> = entries.keys().collect();
        report_ids.sort();
        report_ids
            .into_iter()
            .flat_map(|report_id| entries[report_id].iter().cloned())
            .collect()
    }

    /// Remove the child collection of a deleted report.
    pub fn delete_report(&self, report_id: &str) -> usize {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(report_id)
            .map_or(0, |removed| removed.len())
    }

    pub fn reset(&self) {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
