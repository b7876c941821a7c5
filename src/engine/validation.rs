//! Per-record input validation, batched.
//!
//! Validation is pure: it checks fields and dates without touching the
//! store, so a batch can report every problem up front instead of failing
//! on the first. Balance and duplicate-slot checks are business rules and
//! run inside the transaction, not here.

use chrono::NaiveDate;

use crate::error::{LedgerError, RecordFailure};

use super::mark::MarkRequest;

fn require_non_empty(field: &'static str, value: &str, errors: &mut Vec<LedgerError>) {
    if value.trim().is_empty() {
        errors.push(LedgerError::Validation {
            field: field.to_string(),
            message: "must not be empty".to_string(),
        });
    }
}

/// Validates a single mark request, returning every problem found.
pub fn validate_mark(request: &MarkRequest, today: NaiveDate) -> Vec<LedgerError> {
    let mut errors = Vec::new();
    require_non_empty("employee_id", &request.employee_id, &mut errors);
    require_non_empty("location_id", &request.location_id, &mut errors);
    require_non_empty("marked_by", &request.marked_by, &mut errors);
    if request.date > today {
        errors.push(LedgerError::FutureDated { date: request.date });
    }
    errors
}

/// Validates a whole batch, collecting every failure with its record index.
pub fn validate_batch(requests: &[MarkRequest], today: NaiveDate) -> Vec<RecordFailure> {
    requests
        .iter()
        .enumerate()
        .flat_map(|(index, request)| {
            validate_mark(request, today)
                .into_iter()
                .map(move |error| RecordFailure { index, error })
        })
        .collect()
}
