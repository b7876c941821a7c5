//! Lazy creation of monthly ledger entries.

use rust_decimal::Decimal;

use crate::config::LeavePolicy;
use crate::error::LedgerResult;
use crate::models::{Employee, LedgerEntry, MonthKey};
use crate::store::Transaction;

/// Ensures a ledger entry exists for the employee-month, creating one with
/// a derived opening carry-forward if necessary.
///
/// The opening carry-forward is the prior month's `available` when a prior
/// entry exists, the prior month is within the employment period, and the
/// prior month saw attendance activity; it is zero otherwise, and always
/// zero for January under the no-cross-year policy. `allocated` is the
/// monthly grant for the employee's location.
///
/// Returns the existing or newly created entry. The new entry is buffered
/// in the transaction; it becomes durable when the transaction commits.
pub fn ensure_month(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    employee: &Employee,
    key: MonthKey,
) -> LedgerResult<LedgerEntry> {
    if let Some(entry) = txn.find_ledger_entry(&employee.id, key) {
        return Ok(entry);
    }

    let carried_forward = if policy.resets_carry_into(key.month) {
        Decimal::ZERO
    } else {
        let prev = key.prev();
        if prev < employee.join_month() {
            Decimal::ZERO
        } else {
            let prev_active = txn
                .active_attendance_in_month(&employee.id, prev)
                .iter()
                .any(|record| record.status.is_activity());
            if prev_active {
                txn.find_ledger_entry(&employee.id, prev)
                    .map(|e| e.available)
                    .unwrap_or(Decimal::ZERO)
            } else {
                Decimal::ZERO
            }
        }
    };

    let allocated = policy.monthly_allocation(&employee.location_id);
    let entry = LedgerEntry::new(&employee.id, key, allocated, carried_forward);
    txn.put_ledger_entry(entry.clone());
    Ok(entry)
}
