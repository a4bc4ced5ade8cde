use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Registry of per-report async locks.
///
/// Two transitions on the same report run one after the other; transitions
/// on different reports never wait for each other.
#[derive(Debug, Default)]
pub struct ReportLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// RAII guard for one report's lock. Release happens on drop.
#[derive(Debug)]
pub struct ReportGuard {
    report_id: String,
    _guard: OwnedMutexGuard<()>,
}

impl ReportGuard {
    #[must_use]
    pub fn report_id(&self) -> &str {
        &self.report_id
    }

    /// Explicitly release the lock. Release also happens automatically on drop.
    pub fn release(self) {
        drop(self);
    }
}

impl ReportLocks {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, report_id: &str) -> Arc<AsyncMutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(locks.entry(report_id.to_string()).or_default())
    }

    /// Wait for exclusive access to `report_id`.
    pub async fn acquire(&self, report_id: &str) -> ReportGuard {
        let guard = self.slot(report_id).lock_owned().await;
        ReportGuard {
            report_id: report_id.to_string(),
            _guard: guard,
        }
    }

    /// Take the lock only if nobody holds it.
    #[must_use]
    pub fn try_acquire(&self, report_id: &str) -> Option<ReportGuard> {
        self.slot(report_id)
            .try_lock_owned()
            .ok()
            .map(|guard| ReportGuard {
                report_id: report_id.to_string(),
                _guard: guard,
            })
    }

    /// Forget the lock of a deleted report.
    ///
    /// The slot stays while any task holds or waits on it, so those tasks and
    /// later callers keep sharing one mutex.
    pub fn forget(&self, report_id: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks
            .get(report_id)
            .is_some_and(|slot| Arc::strong_count(slot) == 1)
        {
            locks.remove(report_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn same_report_is_exclusive() {
        let locks = ReportLocks::new();
        let guard = locks.acquire("r-1").await;
        assert_eq!(guard.report_id(), "r-1");

        assert!(locks.try_acquire("r-1").is_none());
        guard.release();
        assert!(locks.try_acquire("r-1").is_some());
    }

    #[tokio::test]
    async fn different_reports_do_not_contend() {
        let locks = ReportLocks::new();
        let _a = locks.acquire("r-1").await;
        assert!(locks.try_acquire("r-2").is_some());
    }

    #[tokio::test]
    async fn forget_keeps_a_held_lock() {
        let locks = ReportLocks::new();
        let guard = locks.acquire("r-1").await;

        locks.forget("r-1");
        assert!(locks.try_acquire("r-1").is_none());

        drop(guard);
        locks.forget("r-1");
        assert!(!locks.locks.lock().unwrap().contains_key("r-1"));
    }

    #[tokio::test]
    async fn forget_keeps_a_waited_on_lock() {
        let locks = Arc::new(ReportLocks::new());
        let guard = locks.acquire("r-1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let _guard = locks.acquire("r-1").await;
                tokio::task::yield_now().await;
            })
        };
        tokio::task::yield_now().await;

        drop(guard);
        locks.forget("r-1");
        assert!(locks.locks.lock().unwrap().contains_key("r-1"));
        waiter.await.unwrap();
    }

    #[tokio::test]
    async fn waiter_proceeds_after_release() {
        let locks = Arc::new(ReportLocks::new());
        let guard = locks.acquire("r-1").await;

        let waiter = {
            let locks = Arc::clone(&locks);
            tokio::spawn(async move {
                let guard = locks.acquire("r-1").await;
                guard.report_id().to_string()
            })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());
        drop(guard);
        assert_eq!(waiter.await.unwrap(), "r-1");
    }
}
