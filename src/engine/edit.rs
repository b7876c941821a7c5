//! Edit operation: re-status (and optionally re-date) an existing record.
//!
//! An edit is a two-sided delta: the old status's cost is credited back to
//! the month it was charged to, and the new status's cost is debited, with
//! a balance check, against the month the record now belongs to. Both
//! sides land in one transaction.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;

use crate::config::LeavePolicy;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger::{ensure_month, propagate};
use crate::models::{AttendanceStatus, LedgerEntry, MonthKey};
use crate::store::Transaction;

use super::{apply_summary_delta, check_balance};

/// The result of a successful edit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EditOutcome {
    /// Id of the edited record.
    pub record_id: String,
    /// The ledger entries of every month the edit touched, post-update,
    /// in chronological order.
    pub ledger: Vec<LedgerEntry>,
}

/// Applies one edit inside an open transaction.
pub(super) fn apply_edit(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    record_id: &str,
    new_status: AttendanceStatus,
    new_date: Option<NaiveDate>,
    edited_by: &str,
    today: NaiveDate,
) -> LedgerResult<EditOutcome> {
    let mut record = txn
        .attendance(record_id)
        .filter(|r| r.is_active())
        .ok_or_else(|| LedgerError::NotFound {
            kind: "attendance record",
            id: record_id.to_string(),
        })?;
    let employee = txn
        .employee(&record.employee_id)
        .ok_or_else(|| LedgerError::NotFound {
            kind: "employee",
            id: record.employee_id.clone(),
        })?;

    let target_date = new_date.unwrap_or(record.date);
    if target_date > today {
        return Err(LedgerError::FutureDated { date: target_date });
    }
    if target_date != record.date {
        if let Some(occupant) =
            txn.find_active_slot(&record.employee_id, &record.location_id, target_date)
        {
            if occupant.id != record.id {
                return Err(LedgerError::DuplicateRecord {
                    employee_id: record.employee_id.clone(),
                    location_id: record.location_id.clone(),
                    date: target_date,
                    existing_status: occupant.status.as_str().to_string(),
                });
            }
        }
    }

    let old_key = MonthKey::of(record.date);
    let new_key = MonthKey::of(target_date);
    let old_cost = record.status.leave_cost(policy);
    let new_cost = new_status.leave_cost(policy);

    // Write the record first so ledger scans inside this transaction see
    // its final shape.
    let old_status = record.status;
    record.status = new_status;
    record.date = target_date;
    record.edited_by = Some(edited_by.to_string());
    txn.put_attendance(record);

    let mut touched = Vec::new();
    let mut summary_delta = Decimal::ZERO;
    if old_key == new_key {
        let mut entry = ensure_month(txn, policy, &employee, old_key)?;
        let taken_before = entry.taken;
        entry.credit(old_cost);
        check_balance(policy, &entry, new_status, &employee.id)?;
        entry.debit(new_cost);
        entry.cap_taken();
        txn.put_ledger_entry(entry.clone());
        propagate(txn, policy, &employee, old_key, entry.available)?;
        summary_delta += entry.taken - taken_before;
        touched.push(entry);
    } else {
        // Two months are involved; settle them in chronological order so
        // an adjacent-month propagation is observed by the later step.
        let mut months = [(old_key, true), (new_key, false)];
        months.sort_by_key(|(key, _)| *key);
        for (key, is_credit) in months {
            let mut entry = ensure_month(txn, policy, &employee, key)?;
            let taken_before = entry.taken;
            if is_credit {
                entry.credit(old_cost);
            } else {
                check_balance(policy, &entry, new_status, &employee.id)?;
                entry.debit(new_cost);
                entry.cap_taken();
            }
            txn.put_ledger_entry(entry.clone());
            propagate(txn, policy, &employee, key, entry.available)?;
            summary_delta += entry.taken - taken_before;
            touched.push(entry);
        }
    }

    // The summary tracks capped consumption; use the ledger's actual
    // movement, not the raw cost difference.
    apply_summary_delta(txn, &employee.id, summary_delta);

    debug!(
        record_id,
        old_status = old_status.as_str(),
        new_status = new_status.as_str(),
        date = %target_date,
        "edited attendance"
    );
    Ok(EditOutcome {
        record_id: record_id.to_string(),
        ledger: touched,
    })
}
