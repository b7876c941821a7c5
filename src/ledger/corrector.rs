//! Authoritative recomputation of an employee's monthly ledger.
//!
//! The corrector does not trust the incrementally maintained counters: it
//! rebuilds every month's consumption from the attendance history, repairs
//! duplicate ledger keys, backfills missing months, and re-derives the
//! carry-forward chain. Running it twice with no intervening attendance
//! changes is a no-op.

use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use tracing::warn;

use crate::config::LeavePolicy;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Employee, LedgerEntry, LeaveSummary, MonthKey};
use crate::store::Transaction;

/// Rebuilds the employee's ledger from the attendance history, month by
/// month from the join month through `as_of` inclusive.
///
/// The algorithm:
/// 1. Deduplicates entries sharing a (year, month) key, keeping the
///    chronologically first and deleting the rest (logged as a
///    data-quality warning).
/// 2. Backfills entries for any missing month in the range.
/// 3. Walks the months in order: the carry-forward is the previous month's
///    `available` only when the previous month has at least one active
///    record with status present, leave, or half-day; a month with no
///    activity carries nothing forward. January opens at zero under the
///    no-cross-year policy. `taken` is the summed leave-equivalent of the
///    month's active records, capped at `allocated + carried_forward`.
/// 4. Refreshes the employee's [`LeaveSummary`] unless `manual_override`
///    is set.
///
/// Months after `as_of` are left untouched. Returns the recomputed entries
/// in chronological order.
pub fn recompute(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    employee_id: &str,
    as_of: MonthKey,
) -> LedgerResult<Vec<LedgerEntry>> {
    let mut employee = txn.employee(employee_id).ok_or(LedgerError::NotFound {
        kind: "employee",
        id: employee_id.to_string(),
    })?;

    // Phase 1: repair duplicate logical keys. Entries arrive sorted by
    // (year, month, id), so the first of each key wins.
    let mut entries: HashMap<MonthKey, LedgerEntry> = HashMap::new();
    let mut seen: HashSet<MonthKey> = HashSet::new();
    for entry in txn.ledger_entries_for(employee_id) {
        let key = entry.key();
        if seen.insert(key) {
            entries.insert(key, entry);
        } else {
            warn!(
                employee_id,
                month = %key,
                duplicate_id = %entry.id,
                "duplicate ledger entry for month, deleting"
            );
            txn.delete_ledger_entry(&entry.id);
        }
    }

    // Phases 2 and 3: backfill and walk in chronological order.
    let allocated = policy.monthly_allocation(&employee.location_id);
    let join = employee.join_month();
    let mut recomputed = Vec::new();
    let mut prev: Option<LedgerEntry> = None;
    let mut key = join;
    while key <= as_of {
        let mut entry = entries
            .remove(&key)
            .unwrap_or_else(|| LedgerEntry::new(employee_id, key, allocated, Decimal::ZERO));
        let original = entry.clone();

        entry.carried_forward = match &prev {
            Some(previous) if !policy.resets_carry_into(key.month) => {
                let active = txn.active_attendance_in_month(employee_id, previous.key());
                if active.iter().any(|r| r.status.is_activity()) {
                    previous.available
                } else {
                    Decimal::ZERO
                }
            }
            _ => Decimal::ZERO,
        };

        entry.taken = txn
            .active_attendance_in_month(employee_id, key)
            .iter()
            .map(|r| r.status.leave_cost(policy))
            .sum();
        entry.cap_taken();

        if entry != original {
            txn.put_ledger_entry(entry.clone());
        }
        prev = Some(entry.clone());
        recomputed.push(entry);
        key = key.next();
    }

    // Phase 4: refresh the yearly summary from the rebuilt ledger, unless
    // an administrator owns it.
    if !employee.manual_override {
        let used: Decimal = recomputed
            .iter()
            .map(|e| e.taken)
            .chain(entries.values().map(|e| e.taken))
            .sum();
        let yearly = (allocated
            * Decimal::from(employee.first_month_of(as_of.year).months_through_december()))
        .round();
        let summary = LeaveSummary {
            allocated: yearly,
            used,
            available: (yearly - used).max(Decimal::ZERO),
        };
        if summary != employee.leave_summary {
            employee.leave_summary = summary;
            txn.put_employee(employee);
        }
    }

    Ok(recomputed)
}
