//! Error types for the Leave Ledger Engine.
//!
//! This module provides strongly-typed errors using the `thiserror` crate
//! for every failure class the engine distinguishes: validation failures,
//! business-rule rejections, missing entities, store-level write conflicts,
//! and exhausted transaction retries.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// The main error type for the Leave Ledger Engine.
///
/// All operations in the engine return this error type. The taxonomy matters
/// for callers: validation and business-rule errors are terminal and must be
/// reported per record, while [`LedgerError::Conflict`] is transient and is
/// retried transparently by the transactional executor before escalating to
/// [`LedgerError::TransactionExhausted`].
///
/// # Example
///
/// ```
/// use leave_ledger::error::LedgerError;
///
/// let error = LedgerError::NotFound {
///     kind: "employee",
///     id: "emp_042".to_string(),
/// };
/// assert_eq!(error.to_string(), "employee not found: emp_042");
/// ```
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Policy configuration file was not found at the specified path.
    #[error("Policy file not found: {path}")]
    ConfigNotFound {
        /// The path that was not found.
        path: String,
    },

    /// Policy configuration file could not be parsed.
    #[error("Failed to parse policy file '{path}': {message}")]
    ConfigParseError {
        /// The path to the file that failed to parse.
        path: String,
        /// A description of the parse error.
        message: String,
    },

    /// An input field was malformed or missing.
    #[error("Invalid field '{field}': {message}")]
    Validation {
        /// The field that was invalid.
        field: String,
        /// A description of what made the field invalid.
        message: String,
    },

    /// The month does not have enough leave balance to cover the debit.
    #[error(
        "Insufficient leave balance for employee '{employee_id}' in {year}-{month:02}: requested {requested}, available {available}"
    )]
    InsufficientBalance {
        /// The employee whose balance was checked.
        employee_id: String,
        /// Ledger year.
        year: i32,
        /// Ledger month (1-12).
        month: u32,
        /// The leave-equivalent cost that was requested.
        requested: Decimal,
        /// The balance that was actually available.
        available: Decimal,
    },

    /// Attendance may not be marked for a date in the future.
    #[error("Attendance date {date} is in the future")]
    FutureDated {
        /// The offending date.
        date: NaiveDate,
    },

    /// An active record already occupies the (employee, location, day) slot.
    ///
    /// Carries the existing record's status so the caller can decide whether
    /// to retry with the overwrite flag.
    #[error(
        "Active attendance record already exists for employee '{employee_id}' at location '{location_id}' on {date} (status: {existing_status})"
    )]
    DuplicateRecord {
        /// The employee the slot belongs to.
        employee_id: String,
        /// The location of the slot.
        location_id: String,
        /// The calendar day of the slot.
        date: NaiveDate,
        /// Status of the record already occupying the slot.
        existing_status: String,
    },

    /// A correction request has already been approved or rejected.
    #[error("Correction request '{request_id}' is already {status}")]
    RequestAlreadyReviewed {
        /// The request id.
        request_id: String,
        /// The terminal status it already holds.
        status: String,
    },

    /// A referenced entity does not exist.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// The entity kind ("employee", "location", "attendance record", ...).
        kind: &'static str,
        /// The id that was looked up.
        id: String,
    },

    /// An atomic batch was rejected because one or more records failed.
    ///
    /// Nothing from the batch was applied. Each failure carries the index of
    /// the offending input record.
    #[error("Batch rejected: {} record(s) failed", failures.len())]
    BatchRejected {
        /// Per-record failures, in input order.
        failures: Vec<RecordFailure>,
    },

    /// Optimistic-concurrency failure: another transaction committed a write
    /// to a record this transaction read.
    #[error("Write conflict: {message}")]
    Conflict {
        /// A description of the conflicting read.
        message: String,
    },

    /// The transactional executor gave up after exhausting its retry budget.
    #[error("Transaction failed after {attempts} attempts")]
    TransactionExhausted {
        /// How many attempts were made.
        attempts: u32,
    },

    /// An underlying store I/O failure. Never retried.
    #[error("Store error: {message}")]
    Store {
        /// A description of the store failure.
        message: String,
    },
}

impl LedgerError {
    /// Returns true if this error is a transient write conflict that the
    /// transactional executor should retry.
    pub fn is_conflict(&self) -> bool {
        matches!(self, LedgerError::Conflict { .. })
    }

    /// Returns true if this error is a business-rule rejection (as opposed
    /// to a validation, not-found, or infrastructure failure).
    pub fn is_business_rule(&self) -> bool {
        matches!(
            self,
            LedgerError::InsufficientBalance { .. }
                | LedgerError::FutureDated { .. }
                | LedgerError::DuplicateRecord { .. }
                | LedgerError::RequestAlreadyReviewed { .. }
        )
    }
}

/// A single failed record within a batch operation.
///
/// Batch callers need to distinguish "this record failed validation" from
/// "this record already exists"; the wrapped [`LedgerError`] keeps that
/// distinction.
#[derive(Debug, Error)]
#[error("record #{index}: {error}")]
pub struct RecordFailure {
    /// Zero-based index of the record in the submitted batch.
    pub index: usize,
    /// The error that record failed with.
    pub error: LedgerError,
}

/// A type alias for Results that return LedgerError.
pub type LedgerResult<T> = Result<T, LedgerError>;
