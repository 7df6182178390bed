use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Voucher {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub voucher_image: String,
    pub status: VoucherStatus,
    pub notes: String,
    pub is_seen: bool,
    pub submitted_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub reviewed_by: Option<Uuid>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoucherStatus {
    Pending,
    Approved,
    Rejected,
}

impl VoucherStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VoucherStatus::Pending => "Pending",
            VoucherStatus::Approved => "Approved",
            VoucherStatus::Rejected => "Rejected",
        }
    }

    pub fn is_decided(&self) -> bool {
        !matches!(self, VoucherStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VoucherDecision {
    Approve,
    Reject,
}

impl VoucherDecision {
    pub fn resulting_status(&self) -> VoucherStatus {
        match self {
            VoucherDecision::Approve => VoucherStatus::Approved,
            VoucherDecision::Reject => VoucherStatus::Rejected,
        }
    }
}

/// A committed review. `enrollment_id` names the enrollment an approval unlocked.
#[derive(Debug, Clone)]
pub struct ReviewOutcome {
    pub voucher: Voucher,
    pub enrollment_id: Option<Uuid>,
}

/// Voucher joined with the student and course it was submitted for.
#[derive(Debug, Clone, Serialize)]
pub struct VoucherDetails {
    #[serde(flatten)]
    pub voucher: Voucher,
    pub student_name: String,
    pub student_email: String,
    pub course_title: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SubmitVoucherRequest {
    pub course_id: Uuid,
    pub voucher_image: String,
}
