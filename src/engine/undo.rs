//! Undo operation: soft-delete records and credit their cost back.
//!
//! Records are never hard-deleted; the soft-delete flag preserves the
//! audit history while the ledger credit restores the balance exactly.

use tracing::debug;

use crate::config::LeavePolicy;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{ensure_month, propagate};
use crate::models::MonthKey;
use crate::store::Transaction;

use super::apply_summary_delta;

/// Soft-deletes the given records inside an open transaction, crediting
/// each record's leave cost back to its month.
///
/// Unknown ids fail the whole transaction with `NotFound`; records that
/// are already deleted are skipped, which makes a repeated undo harmless.
/// Returns the ids that were actually deleted.
pub(super) fn apply_undo(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    record_ids: &[String],
    deleted_by: &str,
) -> LedgerResult<Vec<String>> {
    let mut affected = Vec::new();
    for record_id in record_ids {
        let record = txn
            .attendance(record_id)
            .ok_or_else(|| LedgerError::NotFound {
                kind: "attendance record",
                id: record_id.clone(),
            })?;
        if record.is_deleted {
            debug!(record_id = %record_id, "undo skipped already-deleted record");
            continue;
        }
        let employee = txn
            .employee(&record.employee_id)
            .ok_or_else(|| LedgerError::NotFound {
                kind: "employee",
                id: record.employee_id.clone(),
            })?;

        let cost = record.status.leave_cost(policy);
        let key = MonthKey::of(record.date);

        let mut deleted = record;
        deleted.soft_delete(deleted_by);
        txn.put_attendance(deleted);

        let mut entry = ensure_month(txn, policy, &employee, key)?;
        let taken_before = entry.taken;
        entry.credit(cost);
        txn.put_ledger_entry(entry.clone());
        // Credit what actually came off the capped `taken`.
        apply_summary_delta(txn, &employee.id, entry.taken - taken_before);
        propagate(txn, policy, &employee, key, entry.available)?;

        debug!(
            record_id = %record_id,
            month = %key,
            credited = %cost,
            available = %entry.available,
            "undid attendance record"
        );
        affected.push(record_id.clone());
    }
    Ok(affected)
}
