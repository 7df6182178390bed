use async_trait::async_trait;

use crate::{
    error::Result,
    events::{EventSubscriber, WorkflowEvent},
};

/// Writes every workflow event to the structured log.
pub struct AuditLogSubscriber;

#[async_trait]
impl EventSubscriber for AuditLogSubscriber {
    fn name(&self) -> &str {
        "audit_log"
    }

    async fn handle_event(&self, event: &WorkflowEvent) -> Result<()> {
        match event {
            WorkflowEvent::StudentEnrolled(enrollment) => {
                tracing::info!(
                    enrollment_id = %enrollment.id,
                    student_id = %enrollment.student_id,
                    course_id = %enrollment.course_id,
                    approved = enrollment.is_approved,
                    "student enrolled"
                );
            }
            WorkflowEvent::StudentUnenrolled { enrollment, by } => {
                tracing::info!(
                    enrollment_id = %enrollment.id,
                    student_id = %enrollment.student_id,
                    course_id = %enrollment.course_id,
                    teacher_id = %by,
                    "student unenrolled"
                );
            }
            WorkflowEvent::VoucherSubmitted(voucher) => {
                tracing::info!(
                    voucher_id = %voucher.id,
                    student_id = %voucher.student_id,
                    course_id = %voucher.course_id,
                    "voucher submitted for review"
                );
            }
            WorkflowEvent::VoucherApproved { voucher, enrollment_id } => {
                tracing::info!(
                    voucher_id = %voucher.id,
                    student_id = %voucher.student_id,
                    course_id = %voucher.course_id,
                    enrollment_id = ?enrollment_id,
                    reviewer = ?voucher.reviewed_by,
                    "voucher approved"
                );
            }
            WorkflowEvent::VoucherRejected(voucher) => {
                tracing::info!(
                    voucher_id = %voucher.id,
                    student_id = %voucher.student_id,
                    course_id = %voucher.course_id,
                    reviewer = ?voucher.reviewed_by,
                    notes = %voucher.notes,
                    "voucher rejected"
                );
            }
            WorkflowEvent::VoucherSeen(voucher) => {
                tracing::debug!(voucher_id = %voucher.id, "voucher decision acknowledged");
            }
        }

        Ok(())
    }
}
