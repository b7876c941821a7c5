//! Core data models for the Leave Ledger Engine.
//!
//! This module contains all the domain models used throughout the engine.

mod attendance;
mod correction;
mod employee;
mod ledger;

pub use attendance::{
    AttendanceRecord, AttendanceStatus, LEDGER_OFFSET_SECS, ledger_day, ledger_offset, today,
};
pub use correction::{CorrectionRequest, CorrectionStatus};
pub use employee::{Employee, LeaveSummary, Location};
pub use ledger::{LedgerEntry, MonthKey};
