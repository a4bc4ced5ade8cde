//! Append-only history list with a single "current" pointer.
//!
//! A [`HistoryLedger<T>`] is the building block for every history that has a
//! notion of "the present value": each [`append`](HistoryLedger::append)
//! clears the `is_current` flag on every existing entry and adds a new entry
//! marked current. Entries are otherwise immutable.
//!
//! # Invariants
//!
//! - At most one entry has `is_current = true` at any time.
//! - After any append, exactly one entry is current (the appended one).
//! - Insertion order is preserved; there is no implicit sort.
//! - `append` is pure: it returns a new ledger and leaves `self` untouched.
//! - Identical payloads are never deduplicated, so no-op reassignments stay
//!   visible in the audit trail.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ErrorCode;
use crate::id;

/// One recorded change in a [`HistoryLedger`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry<T> {
    /// Unique entry id.
    pub id: String,
    /// The recorded value.
    pub payload: T,
    /// When the entry was appended.
    pub created_at: DateTime<Utc>,
    /// Whether this entry represents the present value of its list.
    pub is_current: bool,
}

/// Errors raised when rebuilding a ledger from stored entries.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// Stored entries violate the single-current invariant.
    #[error("{}: {count} entries are marked current (ids: {})", ErrorCode::CorruptLedger, .ids.join(", "))]
    MultipleCurrent {
        /// Number of entries marked current.
        count: usize,
        /// Ids of the offending entries.
        ids: Vec<String>,
    },
}

impl LedgerError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MultipleCurrent { .. } => ErrorCode::CorruptLedger,
        }
    }
}

/// Ordered list of [`HistoryEntry<T>`] values with a single current entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct HistoryLedger<T> {
    entries: Vec<HistoryEntry<T>>,
}

impl<T> Default for HistoryLedger<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<T> HistoryLedger<T> {
    /// Create an empty ledger.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Rebuild a ledger from previously stored entries.
    ///
    /// # Errors
    ///
    /// Returns [`LedgerError::MultipleCurrent`] if more than one entry is
    /// marked current. A list where no entry is current is accepted;
    /// [`current`](Self::current) then returns `None`.
    pub fn from_entries(entries: Vec<HistoryEntry<T>>) -> Result<Self, LedgerError> {
        let current: Vec<String> = entries
            .iter()
            .filter(|entry| entry.is_current)
            .map(|entry| entry.id.clone())
            .collect();

        if current.len() > 1 {
            return Err(LedgerError::MultipleCurrent {
                count: current.len(),
                ids: current,
            });
        }

        Ok(Self { entries })
    }

    /// The entry marked current, if any.
    #[must_use]
    pub fn current(&self) -> Option<&HistoryEntry<T>> {
        self.entries.iter().find(|entry| entry.is_current)
    }

    /// All entries in insertion order.
    #[must_use]
    pub fn all(&self) -> &[HistoryEntry<T>] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &HistoryEntry<T>> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consume the ledger, returning its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<HistoryEntry<T>> {
        self.entries
    }
}

impl<T: Clone> HistoryLedger<T> {
    /// Return a new ledger with `payload` appended as the current entry.
    ///
    /// Every existing entry is copied with `is_current = false`.
    #[must_use]
    pub fn append(&self, payload: T) -> Self {
        self.append_with_prefix(id::HISTORY_PREFIX, payload)
    }

    /// Like [`append`](Self::append), with a custom id prefix.
    #[must_use]
    pub fn append_with_prefix(&self, prefix: &str, payload: T) -> Self {
        let mut entries: Vec<HistoryEntry<T>> = self
            .entries
            .iter()
            .map(|entry| HistoryEntry {
                is_current: false,
                ..entry.clone()
            })
            .collect();

        let entry = HistoryEntry {
            id: id::next_id(prefix),
            payload,
            created_at: Utc::now(),
            is_current: true,
        };
        tracing::debug!(entry_id = %entry.id, position = entries.len(), "history entry appended");
        entries.push(entry);

        Self { entries }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for HistoryLedger<T> {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let entries = Vec::<HistoryEntry<T>>::deserialize(deserializer)?;
        Self::from_entries(entries).map_err(serde::de::Error::custom)
    }
}

impl<'a, T> IntoIterator for &'a HistoryLedger<T> {
    type Item = &'a HistoryEntry<T>;
    type IntoIter = std::slice::Iter<'a, HistoryEntry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn current_count<T>(ledger: &HistoryLedger<T>) -> usize {
        ledger.iter().filter(|e| e.is_current).count()
    }

    #[test]
    fn empty_ledger_has_no_current() {
        let ledger: HistoryLedger<u32> = HistoryLedger::new();
        assert!(ledger.is_empty());
        assert!(ledger.current().is_none());
        assert!(ledger.all().is_empty());
    }

    #[test]
    fn append_marks_only_newest_current() {
        let ledger = HistoryLedger::new().append(1).append(2).append(3);

        assert_eq!(ledger.len(), 3);
        assert_eq!(current_count(&ledger), 1);
        assert_eq!(ledger.current().map(|e| e.payload), Some(3));
        assert!(!ledger.all()[0].is_current);
        assert!(!ledger.all()[1].is_current);
    }

    #[test]
    fn append_leaves_input_untouched() {
        let first = HistoryLedger::new().append("a");
        let snapshot = first.clone();

        let second = first.append("b");

        assert_eq!(first, snapshot);
        assert!(first.all()[0].is_current);
        assert_eq!(second.len(), first.len() + 1);
        assert!(!second.all()[0].is_current);
    }

    #[test]
    fn identical_payloads_are_not_deduplicated() {
        let ledger = HistoryLedger::new().append("same").append("same");

        assert_eq!(ledger.len(), 2);
        assert_ne!(ledger.all()[0].id, ledger.all()[1].id);
        assert!(ledger.all()[0].created_at <= ledger.all()[1].created_at);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let ledger = HistoryLedger::new().append(30).append(10).append(20);
        let payloads: Vec<_> = ledger.iter().map(|e| e.payload).collect();
        assert_eq!(payloads, vec![30, 10, 20]);
    }

    #[test]
    fn from_entries_rejects_two_current() {
        let entries = vec![
            HistoryEntry {
                id: "asg-1".into(),
                payload: 1,
                created_at: Utc::now(),
                is_current: true,
            },
            HistoryEntry {
                id: "asg-2".into(),
                payload: 2,
                created_at: Utc::now(),
                is_current: true,
            },
        ];

        let err = HistoryLedger::from_entries(entries).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CorruptLedger);
        assert!(err.to_string().contains("asg-1, asg-2"));
    }

    #[test]
    fn from_entries_accepts_none_current() {
        let entries = vec![HistoryEntry {
            id: "asg-1".into(),
            payload: 1,
            created_at: Utc::now(),
            is_current: false,
        }];

        let ledger = HistoryLedger::from_entries(entries).unwrap();
        assert!(ledger.current().is_none());
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn deserialize_validates_invariant() {
        let ledger = HistoryLedger::new().append(7u8).append(8u8);
        let json = serde_json::to_string(&ledger).unwrap();
        let back: HistoryLedger<u8> = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ledger);

        let broken = json.replace("\"is_current\":false", "\"is_current\":true");
        assert!(serde_json::from_str::<HistoryLedger<u8>>(&broken).is_err());
    }
}
