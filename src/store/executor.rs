//! Retry-on-conflict execution of transactional units of work.
//!
//! Every ledger-mutating operation runs through [`TxnExecutor::execute`]:
//! the whole closure re-runs with a fresh transaction (and therefore fresh
//! reads) whenever the commit hits an optimistic-concurrency conflict,
//! backing off exponentially between attempts. Non-conflict errors abort
//! immediately; exhausting the retry budget surfaces
//! [`LedgerError::TransactionExhausted`].

use std::sync::Arc;

use tracing::warn;

use crate::config::RetrySettings;
use crate::error::{LedgerError, LedgerResult};
use crate::store::{MemoryStore, Transaction};

/// Runs closures as retried atomic transactions against a shared store.
#[derive(Debug, Clone)]
pub struct TxnExecutor {
    store: Arc<MemoryStore>,
    retry: RetrySettings,
}

impl TxnExecutor {
    /// Creates an executor over the given store with the given retry policy.
    pub fn new(store: Arc<MemoryStore>, retry: RetrySettings) -> Self {
        Self { store, retry }
    }

    /// The store this executor runs against.
    pub fn store(&self) -> &Arc<MemoryStore> {
        &self.store
    }

    /// Executes `body` inside a transaction, committing on success.
    ///
    /// The closure must be side-effect-free outside the transaction: on a
    /// write conflict it is re-invoked from scratch against a fresh
    /// transaction, so anything it computed from stale reads is discarded.
    ///
    /// # Errors
    ///
    /// Propagates the first non-conflict error from `body` unchanged.
    /// Returns [`LedgerError::TransactionExhausted`] once conflicts have
    /// burned through `retry.max_attempts` attempts.
    pub fn execute<T>(
        &self,
        mut body: impl FnMut(&mut Transaction<'_>) -> LedgerResult<T>,
    ) -> LedgerResult<T> {
        let max_attempts = self.retry.max_attempts.max(1);
        for attempt in 1..=max_attempts {
            let mut txn = self.store.begin();
            let outcome = body(&mut txn);
            let conflict = match outcome {
                Ok(value) => match txn.commit() {
                    Ok(()) => return Ok(value),
                    Err(err) => err,
                },
                Err(err) if err.is_conflict() => err,
                Err(err) => return Err(err),
            };
            if attempt < max_attempts {
                let delay = self.retry.delay_for(attempt);
                warn!(
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %conflict,
                    "transaction conflict, retrying"
                );
                std::thread::sleep(delay);
            }
        }
        Err(LedgerError::TransactionExhausted {
            attempts: max_attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AttendanceRecord, AttendanceStatus, MonthKey};
    use chrono::NaiveDate;

    fn executor_with(store: Arc<MemoryStore>, max_attempts: u32) -> TxnExecutor {
        TxnExecutor::new(
            store,
            RetrySettings {
                max_attempts,
                base_delay_ms: 1,
                max_delay_ms: 2,
            },
        )
    }

    fn record_on(day: u32) -> AttendanceRecord {
        AttendanceRecord::new(
            "emp_001",
            "loc_01",
            NaiveDate::from_ymd_opt(2025, 3, day).unwrap(),
            AttendanceStatus::Present,
            "admin",
        )
    }

    #[test]
    fn test_successful_body_commits_once() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor_with(store.clone(), 3);
        let mut runs = 0;

        let id = executor
            .execute(|txn| {
                runs += 1;
                let record = record_on(3);
                let id = record.id.clone();
                txn.put_attendance(record);
                Ok(id)
            })
            .unwrap();

        assert_eq!(runs, 1);
        assert!(store.attendance_record(&id).is_some());
    }

    #[test]
    fn test_conflict_from_body_is_retried() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor_with(store, 3);
        let mut runs = 0;

        let result: LedgerResult<()> = executor.execute(|_txn| {
            runs += 1;
            if runs < 3 {
                Err(LedgerError::Conflict {
                    message: "synthetic".to_string(),
                })
            } else {
                Ok(())
            }
        });

        assert!(result.is_ok());
        assert_eq!(runs, 3);
    }

    #[test]
    fn test_commit_conflict_reruns_with_fresh_reads() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor_with(store.clone(), 3);
        let mut runs = 0;

        let result = executor.execute(|txn| {
            runs += 1;
            let seen = txn.active_attendance_in_month("emp_001", MonthKey::new(2025, 3));
            if runs == 1 {
                // Another writer sneaks in between our read and our commit.
                let mut sneak = store.begin();
                sneak.put_attendance(record_on(4));
                sneak.commit().unwrap();
                assert!(seen.is_empty());
            } else {
                // The retry sees the winner's committed write.
                assert_eq!(seen.len(), 1);
            }
            txn.put_attendance(record_on(5));
            Ok(())
        });

        assert!(result.is_ok());
        assert_eq!(runs, 2);
    }

    #[test]
    fn test_retry_ceiling_surfaces_exhaustion() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor_with(store, 3);
        let mut runs = 0;

        let result: LedgerResult<()> = executor.execute(|_txn| {
            runs += 1;
            Err(LedgerError::Conflict {
                message: "always".to_string(),
            })
        });

        assert_eq!(runs, 3);
        assert!(matches!(
            result,
            Err(LedgerError::TransactionExhausted { attempts: 3 })
        ));
    }

    #[test]
    fn test_non_conflict_error_aborts_immediately() {
        let store = Arc::new(MemoryStore::new());
        let executor = executor_with(store, 5);
        let mut runs = 0;

        let result: LedgerResult<()> = executor.execute(|_txn| {
            runs += 1;
            Err(LedgerError::NotFound {
                kind: "employee",
                id: "ghost".to_string(),
            })
        });

        assert_eq!(runs, 1);
        assert!(matches!(result, Err(LedgerError::NotFound { .. })));
    }
}
