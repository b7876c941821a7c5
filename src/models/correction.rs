//! Attendance correction request model.
//!
//! A correction request is how an employee asks for a past day's status to
//! be changed. Approval applies the same debit/credit path as a direct edit;
//! the request itself is terminal once reviewed.

use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::attendance::{AttendanceStatus, ledger_offset};

/// The review state of a correction request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorrectionStatus {
    /// Waiting for a reviewer.
    Pending,
    /// Approved; the requested status was applied to the attendance slot.
    Approved,
    /// Rejected; nothing was applied.
    Rejected,
}

impl CorrectionStatus {
    /// The lowercase wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            CorrectionStatus::Pending => "pending",
            CorrectionStatus::Approved => "approved",
            CorrectionStatus::Rejected => "rejected",
        }
    }
}

/// A request to change the status of one attendance slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectionRequest {
    /// Generated request id.
    pub id: String,
    /// The employee whose attendance should change.
    pub employee_id: String,
    /// The location of the attendance slot.
    pub location_id: String,
    /// The calendar day of the attendance slot.
    pub date: NaiveDate,
    /// The status the requester wants the slot to hold.
    pub requested_status: AttendanceStatus,
    /// Free-text justification.
    pub reason: String,
    /// Review state; terminal once approved or rejected.
    pub status: CorrectionStatus,
    /// Who filed the request.
    pub requested_by: String,
    /// Who reviewed the request, once reviewed.
    pub reviewed_by: Option<String>,
    /// When the request was reviewed.
    pub reviewed_at: Option<DateTime<FixedOffset>>,
}

impl CorrectionRequest {
    /// Creates a new pending request with a generated id.
    pub fn new(
        employee_id: impl Into<String>,
        location_id: impl Into<String>,
        date: NaiveDate,
        requested_status: AttendanceStatus,
        reason: impl Into<String>,
        requested_by: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            employee_id: employee_id.into(),
            location_id: location_id.into(),
            date,
            requested_status,
            reason: reason.into(),
            status: CorrectionStatus::Pending,
            requested_by: requested_by.into(),
            reviewed_by: None,
            reviewed_at: None,
        }
    }

    /// Returns true while the request awaits review.
    pub fn is_pending(&self) -> bool {
        self.status == CorrectionStatus::Pending
    }

    /// Stamps the review outcome and audit fields.
    pub fn review(&mut self, approve: bool, reviewed_by: impl Into<String>) {
        self.status = if approve {
            CorrectionStatus::Approved
        } else {
            CorrectionStatus::Rejected
        };
        self.reviewed_by = Some(reviewed_by.into());
        self.reviewed_at = Some(Utc::now().with_timezone(&ledger_offset()));
    }
}
