use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Course, Voucher, VoucherStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enrollment {
    pub id: Uuid,
    pub student_id: Uuid,
    pub course_id: Uuid,
    pub is_approved: bool,
    pub enrolled_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrollmentStatus {
    pub enrolled: bool,
    pub approved: bool,
}

impl EnrollmentStatus {
    pub fn from_enrollment(enrollment: Option<&Enrollment>) -> Self {
        Self {
            enrolled: enrollment.is_some(),
            approved: enrollment.map(|e| e.is_approved).unwrap_or(false),
        }
    }
}

/// Enrollment joined with the names a review screen needs.
#[derive(Debug, Clone, Serialize)]
pub struct EnrollmentDetails {
    #[serde(flatten)]
    pub enrollment: Enrollment,
    pub student_name: String,
    pub student_email: String,
    pub course_title: String,
    pub progress_percentage: f64,
}

/// Where a (student, course) pair sits in the payment approval workflow.
///
/// Never stored; always derived from the course, the enrollment row and the
/// student's most recent voucher for that course.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalState {
    NotEnrolled,
    EnrolledFree,
    EnrolledPendingPayment,
    VoucherPending,
    VoucherRejected,
    VoucherApproved,
}

impl ApprovalState {
    pub fn derive(
        course: &Course,
        enrollment: Option<&Enrollment>,
        latest_voucher: Option<&Voucher>,
    ) -> Self {
        let Some(enrollment) = enrollment else {
            return ApprovalState::NotEnrolled;
        };

        if !course.is_paid {
            return ApprovalState::EnrolledFree;
        }

        if enrollment.is_approved {
            return ApprovalState::VoucherApproved;
        }

        match latest_voucher.map(|v| v.status) {
            Some(VoucherStatus::Pending) => ApprovalState::VoucherPending,
            Some(VoucherStatus::Rejected) => ApprovalState::VoucherRejected,
            // An approved voucher on an unapproved enrollment means the student was
            // unenrolled and came back; they have to pay again.
            Some(VoucherStatus::Approved) | None => ApprovalState::EnrolledPendingPayment,
        }
    }

    pub fn can_submit_voucher(&self) -> bool {
        matches!(
            self,
            ApprovalState::EnrolledPendingPayment | ApprovalState::VoucherRejected
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::format_price;

    fn course(is_paid: bool) -> Course {
        let now = Utc::now();
        Course {
            id: Uuid::new_v4(),
            teacher_id: Uuid::new_v4(),
            title: "Excel".to_string(),
            description: String::new(),
            thumbnail: None,
            is_paid,
            price_cents: if is_paid { 5000 } else { 0 },
            price: format_price(if is_paid { 5000 } else { 0 }),
            is_published: true,
            created_at: now,
            updated_at: now,
        }
    }

    fn enrollment(course: &Course, is_approved: bool) -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            student_id: Uuid::new_v4(),
            course_id: course.id,
            is_approved,
            enrolled_at: Utc::now(),
            approved_at: None,
        }
    }

    fn voucher(enrollment: &Enrollment, status: VoucherStatus) -> Voucher {
        Voucher {
            id: Uuid::new_v4(),
            student_id: enrollment.student_id,
            course_id: enrollment.course_id,
            voucher_image: "uploads/v.png".to_string(),
            status,
            notes: String::new(),
            is_seen: false,
            submitted_at: Utc::now(),
            reviewed_at: None,
            reviewed_by: None,
        }
    }

    #[test]
    fn test_not_enrolled() {
        let c = course(true);
        assert_eq!(ApprovalState::derive(&c, None, None), ApprovalState::NotEnrolled);
    }

    #[test]
    fn test_free_course_is_enrolled_free() {
        let c = course(false);
        let e = enrollment(&c, true);
        let state = ApprovalState::derive(&c, Some(&e), None);
        assert_eq!(state, ApprovalState::EnrolledFree);
        assert!(!state.can_submit_voucher());
    }

    #[test]
    fn test_paid_course_walks_through_voucher_states() {
        let c = course(true);
        let e = enrollment(&c, false);
        assert_eq!(
            ApprovalState::derive(&c, Some(&e), None),
            ApprovalState::EnrolledPendingPayment
        );

        let pending = voucher(&e, VoucherStatus::Pending);
        let state = ApprovalState::derive(&c, Some(&e), Some(&pending));
        assert_eq!(state, ApprovalState::VoucherPending);
        assert!(!state.can_submit_voucher());

        let rejected = voucher(&e, VoucherStatus::Rejected);
        let state = ApprovalState::derive(&c, Some(&e), Some(&rejected));
        assert_eq!(state, ApprovalState::VoucherRejected);
        assert!(state.can_submit_voucher());

        let approved_enrollment = enrollment(&c, true);
        let approved = voucher(&approved_enrollment, VoucherStatus::Approved);
        let state = ApprovalState::derive(&c, Some(&approved_enrollment), Some(&approved));
        assert_eq!(state, ApprovalState::VoucherApproved);
    }

    #[test]
    fn test_old_approved_voucher_after_reenroll_requires_payment() {
        let c = course(true);
        let e = enrollment(&c, false);
        let old = voucher(&e, VoucherStatus::Approved);
        assert_eq!(
            ApprovalState::derive(&c, Some(&e), Some(&old)),
            ApprovalState::EnrolledPendingPayment
        );
    }
}
