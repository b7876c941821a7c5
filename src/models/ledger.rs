//! Monthly ledger entry model.
//!
//! A [`LedgerEntry`] is one month's leave allocation, consumption, and
//! balance for one employee. Entries are created lazily the first time a
//! month is touched and are never deleted by normal operations; the
//! corrector rebuilds their values from attendance history.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A (year, month) calendar key, ordered chronologically.
///
/// # Example
///
/// ```
/// use leave_ledger::models::MonthKey;
///
/// let dec = MonthKey::new(2024, 12);
/// assert_eq!(dec.next(), MonthKey::new(2025, 1));
/// assert!(dec < dec.next());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MonthKey {
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
}

impl MonthKey {
    /// Creates a month key. The month must be in 1..=12; out-of-range
    /// values are clamped by the validation layer before reaching here.
    pub fn new(year: i32, month: u32) -> Self {
        Self { year, month }
    }

    /// The month key a calendar date falls in.
    pub fn of(date: chrono::NaiveDate) -> Self {
        use chrono::Datelike;
        Self::new(date.year(), date.month())
    }

    /// The month following this one, rolling December into January.
    pub fn next(&self) -> MonthKey {
        if self.month == 12 {
            MonthKey::new(self.year + 1, 1)
        } else {
            MonthKey::new(self.year, self.month + 1)
        }
    }

    /// The month preceding this one, rolling January into December.
    pub fn prev(&self) -> MonthKey {
        if self.month == 1 {
            MonthKey::new(self.year - 1, 12)
        } else {
            MonthKey::new(self.year, self.month - 1)
        }
    }

    /// Returns true for January, the month where carry-forward resets
    /// under the no-cross-year policy.
    pub fn is_january(&self) -> bool {
        self.month == 1
    }

    /// Number of months from this month through December of the same year,
    /// inclusive. Used to prorate a mid-year joiner's yearly allocation.
    pub fn months_through_december(&self) -> u32 {
        13 - self.month
    }
}

impl std::fmt::Display for MonthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}

/// One month's leave ledger for one employee.
///
/// Invariants at rest:
/// - `available == max(0, allocated + carried_forward - taken)`
/// - `taken <= allocated + carried_forward` (consumption is capped)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Generated physical id. The logical key is (employee, year, month);
    /// the corrector repairs any duplicate logical keys it finds.
    pub id: String,
    /// The employee this entry belongs to.
    pub employee_id: String,
    /// Calendar year.
    pub year: i32,
    /// Calendar month, 1-12.
    pub month: u32,
    /// Monthly grant (yearly allocation divided by 12).
    pub allocated: Decimal,
    /// Leave-equivalent consumed this month.
    pub taken: Decimal,
    /// Opening balance inherited from the prior month.
    pub carried_forward: Decimal,
    /// Closing balance.
    pub available: Decimal,
}

impl LedgerEntry {
    /// Creates a fresh entry with no consumption.
    pub fn new(
        employee_id: impl Into<String>,
        key: MonthKey,
        allocated: Decimal,
        carried_forward: Decimal,
    ) -> Self {
        let mut entry = Self {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.into(),
            year: key.year,
            month: key.month,
            allocated,
            taken: Decimal::ZERO,
            carried_forward,
            available: Decimal::ZERO,
        };
        entry.recalculate_available();
        entry
    }

    /// The logical (year, month) key of this entry.
    pub fn key(&self) -> MonthKey {
        MonthKey::new(self.year, self.month)
    }

    /// Total allowance for the month: grant plus opening balance.
    pub fn total_allowance(&self) -> Decimal {
        self.allocated + self.carried_forward
    }

    /// Re-derives `available` from the other three fields, flooring at zero.
    pub fn recalculate_available(&mut self) {
        self.available = (self.total_allowance() - self.taken).max(Decimal::ZERO);
    }

    /// Adds a leave-equivalent cost to `taken` and refreshes `available`.
    ///
    /// The caller is responsible for any balance check; the debit itself
    /// only floors `available` at zero, it never rejects.
    pub fn debit(&mut self, cost: Decimal) {
        self.taken += cost;
        self.recalculate_available();
    }

    /// Removes a previously applied cost from `taken`, flooring at zero,
    /// and refreshes `available`.
    pub fn credit(&mut self, cost: Decimal) {
        self.taken = (self.taken - cost).max(Decimal::ZERO);
        self.recalculate_available();
    }

    /// Clamps `taken` to the month's total allowance and refreshes
    /// `available`. Returns true if the cap changed anything.
    pub fn cap_taken(&mut self) -> bool {
        let allowance = self.total_allowance();
        let capped = self.taken > allowance;
        if capped {
            self.taken = allowance;
        }
        self.recalculate_available();
        capped
    }

    /// Checks the at-rest invariants. Used by tests and property checks.
    pub fn invariants_hold(&self) -> bool {
        self.available == (self.total_allowance() - self.taken).max(Decimal::ZERO)
            && self.taken <= self.total_allowance()
    }
}
