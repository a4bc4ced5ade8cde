//! Report storage contract.
//!
//! The history subsystem never touches a concrete container: it reads and
//! patches reports through [`ReportStore`]. [`InMemoryReportStore`] backs
//! tests and the CLI; a database-backed store only has to honor the same
//! contract.
//!
//! ## Not-found vs failure
//!
//! `update_report` distinguishes a missing report (`Ok(None)`) from a store
//! that could not perform the update (`Err(StoreError)`). Callers treat both
//! as a failed operation but report them with different codes.

pub mod memory;

pub use memory::InMemoryReportStore;

use async_trait::async_trait;

use crate::error::ErrorCode;
use crate::model::{Report, ReportPatch};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not be reached or refused the operation.
    #[error("report store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected the patch.
    #[error("report store rejected update of {report_id}: {reason}")]
    Rejected { report_id: String, reason: String },
}

impl StoreError {
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        ErrorCode::PersistenceFailure
    }
}

#[async_trait]
pub trait ReportStore: Send + Sync {
    /// Read a report by id.
    async fn get_report(&self, id: &str) -> Result<Option<Report>, StoreError>;

    /// All reports, ordered by id.
    async fn list_reports(&self) -> Result<Vec<Report>, StoreError>;

    /// Apply `patch` to the report `id` and return the updated report.
    ///
    /// Returns `Ok(None)` if no report has that id.
    async fn update_report(&self, id: &str, patch: ReportPatch)
    -> Result<Option<Report>, StoreError>;

    /// Remove a report, returning it if it existed.
    async fn remove_report(&self, id: &str) -> Result<Option<Report>, StoreError>;
}
