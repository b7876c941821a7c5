//! Carry-forward propagation into the following month.

use rust_decimal::Decimal;
use tracing::debug;

use crate::config::LeavePolicy;
use crate::engine::apply_summary_delta;
use crate::error::LedgerResult;
use crate::models::{Employee, LedgerEntry, MonthKey};
use crate::store::Transaction;

use super::initializer::ensure_month;

/// Pushes a month's closing `available` into the next month's opening
/// carry-forward.
///
/// The propagated amount is floored at zero, forced to zero across a
/// December-to-January boundary under the no-cross-year policy, and forced
/// to zero when the closing month has no active attendance activity (a
/// silent month does not inflate the next one). The next month's entry is
/// created if it does not exist; its `available` is then re-derived from
/// its own allocation, the new carry, and its own `taken` (with `taken`
/// re-capped so the at-rest invariants hold even when the carry shrank,
/// and the yearly summary adjusted by whatever the cap removed).
///
/// Must run after every mutation that changes a month's closing balance.
pub fn propagate(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    employee: &Employee,
    month: MonthKey,
    closing_available: Decimal,
) -> LedgerResult<LedgerEntry> {
    let next = month.next();
    let has_activity = txn
        .active_attendance_in_month(&employee.id, month)
        .iter()
        .any(|record| record.status.is_activity());
    let carried = if policy.resets_carry_into(next.month) || !has_activity {
        Decimal::ZERO
    } else {
        closing_available.max(Decimal::ZERO)
    };

    let mut entry = ensure_month(txn, policy, employee, next)?;
    let taken_before = entry.taken;
    entry.carried_forward = carried;
    entry.cap_taken();
    debug!(
        employee_id = %employee.id,
        month = %next,
        carried_forward = %carried,
        available = %entry.available,
        "propagated carry-forward"
    );
    txn.put_ledger_entry(entry.clone());
    // A re-cap shrinks consumption; the yearly summary must follow it.
    apply_summary_delta(txn, &employee.id, entry.taken - taken_before);
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::YearBoundaryPolicy;
    use crate::models::{AttendanceRecord, AttendanceStatus, LeaveSummary};
    use crate::store::MemoryStore;
    use chrono::NaiveDate;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn test_employee() -> Employee {
        Employee {
            id: "emp_001".to_string(),
            name: "Asha Rao".to_string(),
            location_id: "loc_01".to_string(),
            join_date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            manual_override: false,
            leave_summary: LeaveSummary::default(),
        }
    }

    fn put_present(txn: &mut Transaction<'_>, key: MonthKey) {
        let date = NaiveDate::from_ymd_opt(key.year, key.month, 3).unwrap();
        txn.put_attendance(AttendanceRecord::new(
            "emp_001",
            "loc_01",
            date,
            AttendanceStatus::Present,
            "admin",
        ));
    }

    #[test]
    fn test_propagates_closing_balance_into_next_month() {
        let store = MemoryStore::new();
        let policy = LeavePolicy::default();
        let employee = test_employee();

        let mut txn = store.begin();
        put_present(&mut txn, MonthKey::new(2025, 3));
        let april = propagate(&mut txn, &policy, &employee, MonthKey::new(2025, 3), dec("1.5"))
            .unwrap();
        txn.commit().unwrap();

        assert_eq!(april.key(), MonthKey::new(2025, 4));
        assert_eq!(april.carried_forward, dec("1.5"));
        assert_eq!(april.available, dec("3.5"));
    }

    #[test]
    fn test_updates_existing_next_month_entry() {
        let store = MemoryStore::new();
        let policy = LeavePolicy::default();
        let employee = test_employee();

        let mut april = LedgerEntry::new("emp_001", MonthKey::new(2025, 4), dec("2"), dec("2"));
        april.debit(Decimal::ONE);
        store.insert_ledger_entry(april);

        let mut txn = store.begin();
        let updated =
            propagate(&mut txn, &policy, &employee, MonthKey::new(2025, 3), dec("0")).unwrap();

        assert_eq!(updated.carried_forward, Decimal::ZERO);
        assert_eq!(updated.taken, Decimal::ONE);
        assert_eq!(updated.available, Decimal::ONE);
        assert!(updated.invariants_hold());
    }

    #[test]
    fn test_negative_closing_balance_propagates_as_zero() {
        let store = MemoryStore::new();
        let policy = LeavePolicy::default();
        let employee = test_employee();

        let mut txn = store.begin();
        put_present(&mut txn, MonthKey::new(2025, 3));
        let april =
            propagate(&mut txn, &policy, &employee, MonthKey::new(2025, 3), dec("-1")).unwrap();
        assert_eq!(april.carried_forward, Decimal::ZERO);
    }

    #[test]
    fn test_month_without_activity_carries_zero() {
        let store = MemoryStore::new();
        let policy = LeavePolicy::default();
        let employee = test_employee();

        let mut txn = store.begin();
        let april =
            propagate(&mut txn, &policy, &employee, MonthKey::new(2025, 3), dec("2")).unwrap();
        assert_eq!(april.carried_forward, Decimal::ZERO);
    }

    #[test]
    fn test_absent_only_month_carries_zero() {
        let store = MemoryStore::new();
        let policy = LeavePolicy::default();
        let employee = test_employee();

        let mut txn = store.begin();
        txn.put_attendance(AttendanceRecord::new(
            "emp_001",
            "loc_01",
            NaiveDate::from_ymd_opt(2025, 3, 3).unwrap(),
            AttendanceStatus::Absent,
            "admin",
        ));
        let april =
            propagate(&mut txn, &policy, &employee, MonthKey::new(2025, 3), dec("2")).unwrap();
        assert_eq!(april.carried_forward, Decimal::ZERO);
    }

    #[test]
    fn test_december_to_january_forces_zero_carry() {
        let store = MemoryStore::new();
        let policy = LeavePolicy::default();
        let employee = test_employee();

        let mut txn = store.begin();
        put_present(&mut txn, MonthKey::new(2024, 12));
        let january =
            propagate(&mut txn, &policy, &employee, MonthKey::new(2024, 12), dec("4")).unwrap();
        assert_eq!(january.key(), MonthKey::new(2025, 1));
        assert_eq!(january.carried_forward, Decimal::ZERO);
    }

    #[test]
    fn test_carry_policy_lets_december_balance_cross() {
        let store = MemoryStore::new();
        let policy = LeavePolicy {
            year_boundary: YearBoundaryPolicy::Carry,
            ..LeavePolicy::default()
        };
        let employee = test_employee();

        let mut txn = store.begin();
        put_present(&mut txn, MonthKey::new(2024, 12));
        let january =
            propagate(&mut txn, &policy, &employee, MonthKey::new(2024, 12), dec("4")).unwrap();
        assert_eq!(january.carried_forward, dec("4"));
    }

    #[test]
    fn test_shrinking_carry_recaps_taken_and_adjusts_summary() {
        let store = MemoryStore::new();
        let policy = LeavePolicy::default();
        let mut employee = test_employee();
        employee.leave_summary = LeaveSummary {
            allocated: dec("24"),
            used: dec("4"),
            available: dec("20"),
        };
        store.insert_employee(employee.clone());

        // Next month already consumed against a generous carry.
        let mut april = LedgerEntry::new("emp_001", MonthKey::new(2025, 4), dec("2"), dec("3"));
        april.debit(dec("4"));
        store.insert_ledger_entry(april);

        let mut txn = store.begin();
        let updated =
            propagate(&mut txn, &policy, &employee, MonthKey::new(2025, 3), dec("0")).unwrap();
        txn.commit().unwrap();

        assert_eq!(updated.carried_forward, Decimal::ZERO);
        assert_eq!(updated.taken, dec("2"));
        assert_eq!(updated.available, Decimal::ZERO);
        assert!(updated.invariants_hold());

        // The cap removed two days of consumption; the summary follows.
        let summary = store.employee("emp_001").unwrap().leave_summary;
        assert_eq!(summary.used, dec("2"));
        assert_eq!(summary.available, dec("22"));
    }
}
