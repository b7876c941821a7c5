//! Attendance record model and the calendar-day convention.
//!
//! Attendance is stored one record per (employee, location, calendar day).
//! Timestamps follow a fixed UTC+05:30 convention and are truncated to whole
//! calendar days for slot matching.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::LeavePolicy;

/// Seconds east of UTC for the ledger's fixed +05:30 convention.
pub const LEDGER_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

/// Returns the fixed +05:30 offset used for all ledger timestamps.
pub fn ledger_offset() -> FixedOffset {
    // The offset is a constant well inside chrono's valid range.
    FixedOffset::east_opt(LEDGER_OFFSET_SECS).unwrap_or_else(|| FixedOffset::east_opt(0).unwrap())
}

/// Truncates a UTC instant to the ledger calendar day it falls on.
///
/// # Example
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use leave_ledger::models::ledger_day;
///
/// // 20:00 UTC is already the next day at +05:30.
/// let instant = Utc.with_ymd_and_hms(2025, 3, 9, 20, 0, 0).unwrap();
/// assert_eq!(ledger_day(instant).to_string(), "2025-03-10");
/// ```
pub fn ledger_day(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&ledger_offset()).date_naive()
}

/// The current ledger calendar day.
pub fn today() -> NaiveDate {
    ledger_day(Utc::now())
}

/// The status recorded for one attendance slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttendanceStatus {
    /// Employee was present for the full day.
    Present,
    /// Employee was absent without leave.
    Absent,
    /// Employee took a full day of leave (costs 1.0 against the balance).
    Leave,
    /// Employee worked half the day (costs the configured half-day weight).
    HalfDay,
}

impl AttendanceStatus {
    /// Returns the leave-equivalent cost of this status against the balance.
    ///
    /// `Leave` costs 1.0, `HalfDay` costs the policy's half-day weight
    /// (0.5 by default), everything else is free.
    pub fn leave_cost(&self, policy: &LeavePolicy) -> Decimal {
        match self {
            AttendanceStatus::Leave => Decimal::ONE,
            AttendanceStatus::HalfDay => policy.half_day_weight,
            AttendanceStatus::Present | AttendanceStatus::Absent => Decimal::ZERO,
        }
    }

    /// Returns true if this status counts as activity for carry-forward
    /// purposes (`Present`, `Leave`, or `HalfDay`; a bare `Absent` does not).
    pub fn is_activity(&self) -> bool {
        !matches!(self, AttendanceStatus::Absent)
    }

    /// The lowercase wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            AttendanceStatus::Present => "present",
            AttendanceStatus::Absent => "absent",
            AttendanceStatus::Leave => "leave",
            AttendanceStatus::HalfDay => "half_day",
        }
    }
}

/// One attendance event for one employee on one calendar day.
///
/// Records are soft-deleted, never removed: `is_deleted` flips on undo and
/// the audit fields keep who touched the record. The engine guarantees at
/// most one non-deleted record per (employee, location, day) slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    /// Generated record id.
    pub id: String,
    /// The employee this record belongs to.
    pub employee_id: String,
    /// The location the attendance was marked at.
    pub location_id: String,
    /// The calendar day of the attendance (+05:30 convention).
    pub date: NaiveDate,
    /// The recorded status.
    pub status: AttendanceStatus,
    /// Who created the record.
    pub marked_by: String,
    /// Who last edited the record, if anyone.
    pub edited_by: Option<String>,
    /// Who soft-deleted the record, if anyone.
    pub deleted_by: Option<String>,
    /// Soft-delete flag; deleted records stay for audit history.
    pub is_deleted: bool,
    /// When the record was soft-deleted.
    pub deleted_at: Option<DateTime<FixedOffset>>,
}

impl AttendanceRecord {
    /// Creates a fresh, active record with a generated id.
    pub fn new(
        employee_id: impl Into<String>,
        location_id: impl Into<String>,
        date: NaiveDate,
        status: AttendanceStatus,
        marked_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.into(),
            location_id: location_id.into(),
            date,
            status,
            marked_by: marked_by.into(),
            edited_by: None,
            deleted_by: None,
            is_deleted: false,
            deleted_at: None,
        }
    }

    /// Returns true if the record is active (not soft-deleted).
    pub fn is_active(&self) -> bool {
        !self.is_deleted
    }

    /// Soft-deletes the record, stamping the deletion audit fields.
    pub fn soft_delete(&mut self, deleted_by: impl Into<String>) {
        self.is_deleted = true;
        self.deleted_by = Some(deleted_by.into());
        self.deleted_at = Some(Utc::now().with_timezone(&ledger_offset()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_policy() -> LeavePolicy {
        LeavePolicy::default()
    }

    #[test]
    fn test_leave_costs_one_full_day() {
        let policy = test_policy();
        assert_eq!(AttendanceStatus::Leave.leave_cost(&policy), Decimal::ONE);
    }

    #[test]
    fn test_half_day_costs_half() {
        let policy = test_policy();
        assert_eq!(
            AttendanceStatus::HalfDay.leave_cost(&policy),
            Decimal::new(5, 1)
        );
    }

    #[test]
    fn test_present_and_absent_cost_nothing() {
        let policy = test_policy();
        assert_eq!(AttendanceStatus::Present.leave_cost(&policy), Decimal::ZERO);
        assert_eq!(AttendanceStatus::Absent.leave_cost(&policy), Decimal::ZERO);
    }

    #[test]
    fn test_absent_is_not_activity() {
        assert!(AttendanceStatus::Present.is_activity());
        assert!(AttendanceStatus::Leave.is_activity());
        assert!(AttendanceStatus::HalfDay.is_activity());
        assert!(!AttendanceStatus::Absent.is_activity());
    }

    #[test]
    fn test_ledger_day_shifts_late_utc_evening_to_next_day() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 9, 20, 0, 0).unwrap();
        assert_eq!(
            ledger_day(instant),
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap()
        );
    }

    #[test]
    fn test_ledger_day_keeps_utc_morning_on_same_day() {
        let instant = Utc.with_ymd_and_hms(2025, 3, 9, 6, 0, 0).unwrap();
        assert_eq!(
            ledger_day(instant),
            NaiveDate::from_ymd_opt(2025, 3, 9).unwrap()
        );
    }

    #[test]
    fn test_new_record_is_active_with_generated_id() {
        let record = AttendanceRecord::new(
            "emp_001",
            "loc_01",
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            AttendanceStatus::Present,
            "admin",
        );
        assert!(record.is_active());
        assert!(!record.id.is_empty());
        assert_eq!(record.edited_by, None);
        assert_eq!(record.deleted_at, None);
    }

    #[test]
    fn test_soft_delete_preserves_record() {
        let mut record = AttendanceRecord::new(
            "emp_001",
            "loc_01",
            NaiveDate::from_ymd_opt(2025, 3, 10).unwrap(),
            AttendanceStatus::Leave,
            "admin",
        );
        record.soft_delete("supervisor");

        assert!(!record.is_active());
        assert_eq!(record.deleted_by.as_deref(), Some("supervisor"));
        assert!(record.deleted_at.is_some());
        // Audit fields survive the delete.
        assert_eq!(record.status, AttendanceStatus::Leave);
        assert_eq!(record.marked_by, "admin");
    }

    #[test]
    fn test_status_serialization_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::HalfDay).unwrap(),
            "\"half_day\""
        );
        assert_eq!(
            serde_json::to_string(&AttendanceStatus::Leave).unwrap(),
            "\"leave\""
        );
    }

    #[test]
    fn test_record_serde_round_trip() {
        let record = AttendanceRecord::new(
            "emp_002",
            "loc_03",
            NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            AttendanceStatus::HalfDay,
            "admin",
        );
        let json = serde_json::to_string(&record).unwrap();
        let back: AttendanceRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }
}
