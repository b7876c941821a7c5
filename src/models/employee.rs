//! Employee model and the yearly leave summary.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::MonthKey;

/// Aggregate of an employee's ledger entries for the year.
///
/// Recomputed by the ledger corrector as the sum of capped `taken` across
/// entries, unless the employee is flagged `manual_override`: then an
/// administrator set these numbers directly and auto-recomputation must
/// leave them alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LeaveSummary {
    /// Yearly allocation, prorated from the join month.
    pub allocated: Decimal,
    /// Total leave-equivalent consumed.
    pub used: Decimal,
    /// Remaining balance, floored at zero.
    pub available: Decimal,
}

/// An employee whose attendance feeds the leave ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    /// Unique identifier for the employee.
    pub id: String,
    /// Display name.
    pub name: String,
    /// The employee's home location.
    pub location_id: String,
    /// The date the employee joined; no ledger entry exists before this.
    pub join_date: NaiveDate,
    /// When set, an administrator owns the leave summary and the corrector
    /// must not overwrite it.
    #[serde(default)]
    pub manual_override: bool,
    /// The yearly leave aggregate.
    #[serde(default)]
    pub leave_summary: LeaveSummary,
}

impl Employee {
    /// The first ledger month for this employee.
    pub fn join_month(&self) -> MonthKey {
        use chrono::Datelike;
        MonthKey::new(self.join_date.year(), self.join_date.month())
    }

    /// The first ledger month of `year` for this employee: the join month
    /// if they joined during that year, January if they joined earlier.
    pub fn first_month_of(&self, year: i32) -> MonthKey {
        let join = self.join_month();
        if join.year == year {
            join
        } else {
            MonthKey::new(year, 1)
        }
    }
}

/// A work location employees mark attendance at.
///
/// Locations may carry their own yearly leave allocation via the policy's
/// location overrides; the model itself is just an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Unique identifier for the location.
    pub id: String,
    /// Display name.
    pub name: String,
}
