//! Correction requests: filing and review.
//!
//! Approval applies the same debit/credit path as a direct edit (or a
//! mark, when the slot has no active record), inside the same transaction
//! that flips the request to approved. A balance rejection therefore
//! leaves the request pending.

use chrono::NaiveDate;

use crate::config::LeavePolicy;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{AttendanceStatus, CorrectionRequest};
use crate::store::Transaction;

use super::edit::apply_edit;
use super::mark::{MarkRequest, apply_mark};

/// The input to [`crate::engine::LeaveEngine::request_correction`].
#[derive(Debug, Clone)]
pub struct CorrectionInput {
    /// The employee whose attendance should change.
    pub employee_id: String,
    /// The location of the attendance slot.
    pub location_id: String,
    /// The calendar day of the attendance slot.
    pub date: NaiveDate,
    /// The status the requester wants.
    pub requested_status: AttendanceStatus,
    /// Free-text justification.
    pub reason: String,
    /// Who is filing the request.
    pub requested_by: String,
}

/// Files a pending correction request inside an open transaction.
pub(super) fn apply_request_correction(
    txn: &mut Transaction<'_>,
    input: &CorrectionInput,
    today: NaiveDate,
) -> LedgerResult<CorrectionRequest> {
    if input.employee_id.trim().is_empty() {
        return Err(LedgerError::Validation {
            field: "employee_id".to_string(),
            message: "must not be empty".to_string(),
        });
    }
    if input.date > today {
        return Err(LedgerError::FutureDated { date: input.date });
    }
    if txn.employee(&input.employee_id).is_none() {
        return Err(LedgerError::NotFound {
            kind: "employee",
            id: input.employee_id.clone(),
        });
    }
    if !txn.location_exists(&input.location_id) {
        return Err(LedgerError::NotFound {
            kind: "location",
            id: input.location_id.clone(),
        });
    }

    let request = CorrectionRequest::new(
        &input.employee_id,
        &input.location_id,
        input.date,
        input.requested_status,
        &input.reason,
        &input.requested_by,
    );
    txn.put_correction(request.clone());
    Ok(request)
}

/// Reviews a pending request inside an open transaction.
///
/// Only pending requests may be reviewed. On approval, the requested
/// status is applied to the slot's active record through the edit path,
/// or through the mark path when no active record exists.
pub(super) fn apply_handle_correction(
    txn: &mut Transaction<'_>,
    policy: &LeavePolicy,
    request_id: &str,
    approve: bool,
    reviewed_by: &str,
    today: NaiveDate,
) -> LedgerResult<CorrectionRequest> {
    let mut request = txn
        .correction(request_id)
        .ok_or_else(|| LedgerError::NotFound {
            kind: "correction request",
            id: request_id.to_string(),
        })?;
    if !request.is_pending() {
        return Err(LedgerError::RequestAlreadyReviewed {
            request_id: request_id.to_string(),
            status: request.status.as_str().to_string(),
        });
    }

    request.review(approve, reviewed_by);
    txn.put_correction(request.clone());

    if approve {
        let existing =
            txn.find_active_slot(&request.employee_id, &request.location_id, request.date);
        match existing {
            Some(record) => {
                apply_edit(
                    txn,
                    policy,
                    &record.id,
                    request.requested_status,
                    None,
                    reviewed_by,
                    today,
                )?;
            }
            None => {
                apply_mark(
                    txn,
                    policy,
                    &MarkRequest {
                        employee_id: request.employee_id.clone(),
                        location_id: request.location_id.clone(),
                        date: request.date,
                        status: request.requested_status,
                        marked_by: reviewed_by.to_string(),
                        overwrite: false,
                    },
                )?;
            }
        }
    }

    Ok(request)
}
