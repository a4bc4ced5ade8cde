use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use async_trait::async_trait;

use super::{ReportStore, StoreError};
use crate::model::{Report, ReportPatch};

/// Report store held entirely in memory.
///
/// Lifecycle: build with [`new`](Self::new) or [`with_reports`](Self::with_reports),
/// [`seed`](Self::seed) more reports at any time, [`reset`](Self::reset)
/// between tests.
#[derive(Debug, Default)]
pub struct InMemoryReportStore {
    reports: RwLock<BTreeMap<String, Report>>,
}

impl InMemoryReportStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_reports(reports: impl IntoIterator<Item = Report>) -> Self {
        let store = Self::new();
        store.seed(reports);
        store
    }

    /// Insert or replace reports.
    pub fn seed(&self, reports: impl IntoIterator<Item = Report>) {
        let mut map = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        for report in reports {
            map.insert(report.id.clone(), report);
        }
    }

    /// Remove every report.
    pub fn reset(&self) {
        self.reports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    /// Synchronous copy of every report, ordered by id.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Report> {
        self.reports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ReportStore for InMemoryReportStore {
    async fn get_report(&self, id: &str) -> Result<Option<Report>, StoreError> {
        Ok(self
            .reports
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned())
    }

    async fn list_reports(&self) -> Result<Vec<Report>, StoreError> {
        Ok(self.snapshot())
    }

    async fn update_report(
        &self,
        id: &str,
        patch: ReportPatch,
    ) -> Result<Option<Report>, StoreError> {
        let mut reports = self.reports.write().unwrap_or_else(PoisonError::into_inner);
        Ok(reports.get_mut(id).map(|report| {
            patch.apply(report);
            report.clone()
        }))
    }

    async fn remove_report(&self, id: &str) -> Result<Option<Report>, StoreError> {
        Ok(self
            .reports
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id))
    }
}
