//! Mark and bulk-mark operations.
//!
//! Marking creates an attendance record for a slot and debits the month's
//! ledger in the same transaction. Bulk marking is two-phase: every input
//! is validated first (collecting all errors), then the valid records are
//! applied sequentially inside one transaction, so a batch is all-or-nothing
//! unless the caller explicitly accepts partial application.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LeavePolicy;
use crate::error::{LedgerError, LedgerResult, RecordFailure};
use crate::ledger::{ensure_month, propagate};
use crate::models::{AttendanceRecord, AttendanceStatus, LedgerEntry, MonthKey};
use crate::store::Transaction;

use super::validation::validate_batch;
use super::{apply_summary_delta, check_balance};

/// The input to a mark operation: one attendance slot and its status.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarkRequest {
    /// The employee to mark.
    pub employee_id: String,
    /// The location the attendance belongs to.
    pub location_id: String,
    /// The calendar day to mark.
    pub date: NaiveDate,
    /// The status to record.
    pub status: AttendanceStatus,
    /// Who is marking.
    pub marked_by: String,
    /// When true, an existing active record in the slot is soft-replaced
    /// (its cost credited back) instead of rejected as a duplicate.
    #[serde(default)]
    pub overwrite: bool,
}

/// The result of a successful mark: the new record and the updated month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkOutcome {
    /// Id of the created attendance record.
    pub record_id: String,
    /// The month's ledger entry after the debit.
    pub ledger: LedgerEntry,
}

/// The result of a bulk mark.
#[derive(Debug)]
pub struct BulkMarkReport {
    /// Ids of the records that were applied, in input order.
    pub applied: Vec<String>,
    /// Records that failed, with their input indices. Empty unless the
    /// caller asked for partial application.
    pub failures: Vec<RecordFailure>,
}

/// Applies one mark inside an open transaction.
pub(super) fn apply_mark(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    request: &MarkRequest,
) -> LedgerResult<MarkOutcome> {
    let employee = txn
        .employee(&request.employee_id)
        .ok_or_else(|| LedgerError::NotFound {
            kind: "employee",
            id: request.employee_id.clone(),
        })?;
    if !txn.location_exists(&request.location_id) {
        return Err(LedgerError::NotFound {
            kind: "location",
            id: request.location_id.clone(),
        });
    }

    let key = MonthKey::of(request.date);
    let mut entry = ensure_month(txn, policy, &employee, key)?;
    let taken_before = entry.taken;

    // Nothing is buffered until the balance check passes. A partial bulk
    // commits around a failed mark, so a failed overwrite must leave the
    // occupant untouched.
    let mut replaced = None;
    if let Some(existing) =
        txn.find_active_slot(&request.employee_id, &request.location_id, request.date)
    {
        if !request.overwrite {
            return Err(LedgerError::DuplicateRecord {
                employee_id: request.employee_id.clone(),
                location_id: request.location_id.clone(),
                date: request.date,
                existing_status: existing.status.as_str().to_string(),
            });
        }
        entry.credit(existing.status.leave_cost(policy));
        replaced = Some(existing);
    }

    check_balance(policy, &entry, request.status, &request.employee_id)?;

    if let Some(mut occupant) = replaced {
        occupant.soft_delete(&request.marked_by);
        txn.put_attendance(occupant);
    }
    entry.debit(request.status.leave_cost(policy));
    // Statuses exempt from the balance check can push `taken` past the
    // allowance; clamp it the same way a rebuild would.
    entry.cap_taken();
    txn.put_ledger_entry(entry.clone());

    let record = AttendanceRecord::new(
        &request.employee_id,
        &request.location_id,
        request.date,
        request.status,
        &request.marked_by,
    );
    let record_id = record.id.clone();
    txn.put_attendance(record);

    // The summary tracks capped consumption, so the delta is the entry's
    // actual movement, not the raw status cost.
    apply_summary_delta(txn, &employee.id, entry.taken - taken_before);
    propagate(txn, policy, &employee, key, entry.available)?;

    debug!(
        employee_id = %request.employee_id,
        date = %request.date,
        status = request.status.as_str(),
        taken = %entry.taken,
        available = %entry.available,
        "marked attendance"
    );
    Ok(MarkOutcome {
        record_id,
        ledger: entry,
    })
}

/// Applies a whole batch inside an open transaction.
///
/// Runs validation again inside the transaction body so a retried attempt
/// starts from scratch. With `allow_partial` unset, any failure aborts the
/// transaction with [`LedgerError::BatchRejected`] and nothing is applied.
pub(super) fn apply_bulk_mark(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    requests: &[MarkRequest],
    overwrite: bool,
    allow_partial: bool,
    today: NaiveDate,
) -> LedgerResult<BulkMarkReport> {
    let mut failures = validate_batch(requests, today);
    if !failures.is_empty() && !allow_partial {
        return Err(LedgerError::BatchRejected { failures });
    }

    let failed_up_front: Vec<usize> = failures.iter().map(|f| f.index).collect();
    let mut applied = Vec::new();
    for (index, request) in requests.iter().enumerate() {
        if failed_up_front.contains(&index) {
            continue;
        }
        let effective = MarkRequest {
            overwrite: overwrite || request.overwrite,
            ..request.clone()
        };
        match apply_mark(txn, policy, &effective) {
            Ok(outcome) => applied.push(outcome.record_id),
            Err(error) if error.is_conflict() => return Err(error),
            Err(error) => {
                failures.push(RecordFailure { index, error });
                if !allow_partial {
                    return Err(LedgerError::BatchRejected { failures });
                }
            }
        }
    }

    Ok(BulkMarkReport { applied, failures })
}
