//! reportes-core library.
//!
//! Append-only history for citizen reports: assignment ledgers with a single
//! current entry, a state-transition service that keeps an audit trail even
//! when the report update fails, and a date-ordered activity log.
//!
//! # Conventions
//!
//! - **Errors**: typed `thiserror` enums per component, each mapping to an
//!   [`ErrorCode`]; `anyhow::Result` at file and config boundaries.
//! - **Logging**: `tracing` macros (`info!`, `warn!`, `error!`, `debug!`).

pub mod activity;
pub mod assignment;
pub mod config;
pub mod desk;
pub mod error;
pub mod id;
pub mod ledger;
pub mod lock;
pub mod model;
pub mod notify;
pub mod state_history;
pub mod store;
pub mod summary;
pub mod transition;

pub use activity::{ActivityEntry, ActivityEntryInput, ActivityLog};
pub use assignment::{AssignError, Assignment, AssignmentHistoryEntry, AssignmentTracker};
pub use desk::{DeletedReport, DeskSnapshot, ReportDesk};
pub use error::ErrorCode;
pub use ledger::{HistoryEntry, HistoryLedger, LedgerError};
pub use model::{Report, ReportState, StateKind, UserRef, UserStatus};
pub use notify::{Notification, Notifier, RecordingNotifier, TracingNotifier};
pub use state_history::{ChangeType, StateHistory, StateHistoryEntry};
pub use store::{InMemoryReportStore, ReportStore, StoreError};
pub use summary::DashboardSummary;
pub use transition::{StateTransitionService, TransitionError, TransitionOutcome};
