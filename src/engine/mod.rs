//! The mutation operations and their transactional facade.
//!
//! [`LeaveEngine`] is the exposed surface: `mark`, `bulk_mark`, `edit`,
//! `undo`, `request_correction`, `handle_correction`, and the repair
//! operation `recompute_employee`. Every call validates its inputs, then
//! runs as one retried atomic transaction through the executor.

mod correction;
mod edit;
mod mark;
mod undo;
mod validation;

pub use correction::CorrectionInput;
pub use edit::EditOutcome;
pub use mark::{BulkMarkReport, MarkOutcome, MarkRequest};
pub use validation::{validate_batch, validate_mark};

use std::sync::Arc;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::config::LeavePolicy;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::recompute;
use crate::models::{AttendanceStatus, CorrectionRequest, LedgerEntry, MonthKey, today};
use crate::store::{MemoryStore, Transaction, TxnExecutor};

/// Rejects a debit that the month's balance cannot cover.
///
/// Full-day leave always requires a full day available; a half-day is
/// balance-constrained only when the policy says so.
pub(crate) fn check_balance(
    policy: &LeavePolicy,
    entry: &LedgerEntry,
    status: AttendanceStatus,
    employee_id: &str,
) -> LedgerResult<()> {
    let required = match status {
        AttendanceStatus::Leave => Decimal::ONE,
        AttendanceStatus::HalfDay if policy.half_day_requires_balance => policy.half_day_weight,
        _ => return Ok(()),
    };
    if entry.available < required {
        return Err(LedgerError::InsufficientBalance {
            employee_id: employee_id.to_string(),
            year: entry.year,
            month: entry.month,
            requested: required,
            available: entry.available,
        });
    }
    Ok(())
}

/// Adjusts the employee's yearly summary by a leave-equivalent delta.
///
/// No-op for a zero delta or a manually overridden summary. `used` floors
/// at zero; `available` is re-derived from the existing yearly allocation.
pub(crate) fn apply_summary_delta(txn: &mut Transaction<'_>, employee_id: &str, delta: Decimal) {
    if delta == Decimal::ZERO {
        return;
    }
    let Some(mut employee) = txn.employee(employee_id) else {
        return;
    };
    if employee.manual_override {
        return;
    }
    let summary = &mut employee.leave_summary;
    summary.used = (summary.used + delta).max(Decimal::ZERO);
    summary.available = (summary.allocated - summary.used).max(Decimal::ZERO);
    txn.put_employee(employee);
}

/// The Leave Ledger Engine.
///
/// Owns a policy and a handle to the transactional store; exposes the
/// attendance mutation operations. Cheap to clone.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use chrono::NaiveDate;
/// use leave_ledger::config::LeavePolicy;
/// use leave_ledger::engine::{LeaveEngine, MarkRequest};
/// use leave_ledger::models::AttendanceStatus;
/// use leave_ledger::store::MemoryStore;
///
/// let engine = LeaveEngine::new(Arc::new(MemoryStore::new()), LeavePolicy::default());
/// let outcome = engine.mark(MarkRequest {
///     employee_id: "emp_001".to_string(),
///     location_id: "loc_01".to_string(),
///     date: NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
///     status: AttendanceStatus::Leave,
///     marked_by: "admin".to_string(),
///     overwrite: false,
/// })?;
/// println!("available: {}", outcome.ledger.available);
/// # Ok::<(), leave_ledger::error::LedgerError>(())
/// ```
#[derive(Debug, Clone)]
pub struct LeaveEngine {
    policy: LeavePolicy,
    executor: TxnExecutor,
}

impl LeaveEngine {
    /// Creates an engine over a store with the given policy.
    pub fn new(store: Arc<MemoryStore>, policy: LeavePolicy) -> Self {
        let executor = TxnExecutor::new(store, policy.retry);
        Self { policy, executor }
    }

    /// The policy this engine runs under.
    pub fn policy(&self) -> &LeavePolicy {
        &self.policy
    }

    /// The underlying store.
    pub fn store(&self) -> &Arc<MemoryStore> {
        self.executor.store()
    }

    /// Marks attendance for one slot, debiting the ledger for leave
    /// statuses and propagating the month's new closing balance.
    ///
    /// # Errors
    ///
    /// Validation errors for malformed fields, [`LedgerError::FutureDated`]
    /// for future dates, [`LedgerError::NotFound`] for unknown employees or
    /// locations, [`LedgerError::DuplicateRecord`] when the slot is taken
    /// and overwrite is off, [`LedgerError::InsufficientBalance`] when a
    /// balance-constrained status cannot be covered.
    pub fn mark(&self, request: MarkRequest) -> LedgerResult<MarkOutcome> {
        let now = today();
        if let Some(error) = validation::validate_mark(&request, now).into_iter().next() {
            return Err(error);
        }
        self.executor
            .execute(|txn| mark::apply_mark(txn, &self.policy, &request))
    }

    /// Marks a batch of slots in one atomic transaction.
    ///
    /// Phase one validates every input and collects all errors; phase two
    /// applies the valid records sequentially inside a single transaction.
    /// With `allow_partial` unset, any failure rejects the whole batch with
    /// [`LedgerError::BatchRejected`] and nothing is applied. Duplicate
    /// slots surface as [`LedgerError::DuplicateRecord`] per record so the
    /// caller can choose to resubmit with `overwrite`.
    pub fn bulk_mark(
        &self,
        requests: &[MarkRequest],
        overwrite: bool,
        allow_partial: bool,
    ) -> LedgerResult<BulkMarkReport> {
        let now = today();
        self.executor.execute(|txn| {
            mark::apply_bulk_mark(txn, &self.policy, requests, overwrite, allow_partial, now)
        })
    }

    /// Changes the status (and optionally the date) of an existing record,
    /// crediting the old cost and debiting the new one atomically.
    pub fn edit(
        &self,
        record_id: &str,
        new_status: AttendanceStatus,
        new_date: Option<NaiveDate>,
        edited_by: &str,
    ) -> LedgerResult<EditOutcome> {
        let now = today();
        self.executor.execute(|txn| {
            edit::apply_edit(txn, &self.policy, record_id, new_status, new_date, edited_by, now)
        })
    }

    /// Soft-deletes records and credits their cost back, in one
    /// transaction. Returns the ids that were actually deleted.
    pub fn undo(&self, record_ids: &[String], deleted_by: &str) -> LedgerResult<Vec<String>> {
        self.executor
            .execute(|txn| undo::apply_undo(txn, &self.policy, record_ids, deleted_by))
    }

    /// Files a pending correction request for an attendance slot.
    pub fn request_correction(&self, input: CorrectionInput) -> LedgerResult<CorrectionRequest> {
        let now = today();
        self.executor
            .execute(|txn| correction::apply_request_correction(txn, &input, now))
    }

    /// Approves or rejects a pending correction request. Approval applies
    /// the requested status through the edit path (or the mark path when
    /// the slot is empty) in the same transaction.
    pub fn handle_correction(
        &self,
        request_id: &str,
        approve: bool,
        reviewed_by: &str,
    ) -> LedgerResult<CorrectionRequest> {
        let now = today();
        self.executor.execute(|txn| {
            correction::apply_handle_correction(
                txn,
                &self.policy,
                request_id,
                approve,
                reviewed_by,
                now,
            )
        })
    }

    /// Rebuilds the employee's ledger from the attendance history, from
    /// the join month through `as_of`. See [`crate::ledger::recompute`].
    pub fn recompute_employee(
        &self,
        employee_id: &str,
        as_of: MonthKey,
    ) -> LedgerResult<Vec<LedgerEntry>> {
        self.executor
            .execute(|txn| recompute(txn, &self.policy, employee_id, as_of))
    }
}
