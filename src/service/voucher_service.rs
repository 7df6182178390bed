use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    events::{EventDispatcher, WorkflowEvent},
    repository::{CourseRepository, EnrollmentRepository, VoucherRepository},
};

pub struct VoucherService {
    course_repo: Arc<dyn CourseRepository>,
    enrollment_repo: Arc<dyn EnrollmentRepository>,
    voucher_repo: Arc<dyn VoucherRepository>,
    events: Arc<EventDispatcher>,
}

impl VoucherService {
    pub fn new(
        course_repo: Arc<dyn CourseRepository>,
        enrollment_repo: Arc<dyn EnrollmentRepository>,
        voucher_repo: Arc<dyn VoucherRepository>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self { course_repo, enrollment_repo, voucher_repo, events }
    }

    /// Records a payment receipt for review by the course owner.
    pub async fn submit(
        &self,
        student: &User,
        course_id: Uuid,
        voucher_image: &str,
    ) -> Result<Voucher> {
        if !student.is_student() {
            return Err(AppError::Forbidden("Only students can submit vouchers".to_string()));
        }

        let voucher_image = voucher_image.trim();
        if voucher_image.is_empty() {
            return Err(AppError::Validation("Voucher image is required".to_string()));
        }

        let enrollment = self.enrollment_repo
            .find_by_student_and_course(student.id, course_id)
            .await?
            .ok_or(AppError::NoActiveEnrollment {
                student_id: student.id,
                course_id,
            })?;

        if enrollment.is_approved {
            return Err(AppError::EnrollmentAlreadyApproved {
                student_id: student.id,
                course_id,
            });
        }

        let voucher = self.voucher_repo
            .create(student.id, course_id, voucher_image)
            .await?;

        self.events
            .publish(WorkflowEvent::VoucherSubmitted(voucher.clone()))
            .await;

        Ok(voucher)
    }

    /// Pending vouchers across the teacher's courses, oldest first.
    pub async fn list_pending(&self, teacher: &User) -> Result<Vec<VoucherDetails>> {
        if !teacher.is_teacher() {
            return Err(AppError::Forbidden("Only teachers review vouchers".to_string()));
        }

        self.voucher_repo.list_pending_for_teacher(teacher.id).await
    }

    pub async fn list_history(&self, teacher: &User) -> Result<Vec<VoucherDetails>> {
        if !teacher.is_teacher() {
            return Err(AppError::Forbidden("Only teachers review vouchers".to_string()));
        }

        self.voucher_repo.list_for_teacher(teacher.id).await
    }

    pub async fn list_for_student(&self, student: &User) -> Result<Vec<VoucherDetails>> {
        self.voucher_repo.list_for_student(student.id).await
    }

    /// The list a user sees by default: the review queue for teachers, their
    /// own submissions for students.
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<VoucherDetails>> {
        match user.role {
            UserRole::Teacher => self.list_pending(user).await,
            UserRole::Student => self.list_for_student(user).await,
        }
    }

    pub async fn get(&self, user: &User, voucher_id: Uuid) -> Result<Voucher> {
        let voucher = self.voucher_repo.find_by_id(voucher_id).await?
            .ok_or_else(|| AppError::NotFound("Voucher not found".to_string()))?;

        if voucher.student_id == user.id {
            return Ok(voucher);
        }

        let owns_course = self.course_repo.find_by_id(voucher.course_id).await?
            .map(|course| course.is_owned_by(user.id))
            .unwrap_or(false);

        if owns_course {
            Ok(voucher)
        } else {
            Err(AppError::NotOwner {
                user_id: user.id,
                entity: "voucher",
                entity_id: voucher_id,
            })
        }
    }

    /// Approves or rejects a pending voucher. Approval grants course access in
    /// the same transaction.
    pub async fn decide(
        &self,
        teacher: &User,
        voucher_id: Uuid,
        decision: VoucherDecision,
        notes: Option<&str>,
    ) -> Result<Voucher> {
        if !teacher.is_teacher() {
            return Err(AppError::NotOwner {
                user_id: teacher.id,
                entity: "voucher",
                entity_id: voucher_id,
            });
        }

        let notes = notes.map(str::trim).unwrap_or_default();
        if decision == VoucherDecision::Reject && notes.is_empty() {
            tracing::warn!(%voucher_id, reviewer = %teacher.id, "voucher rejected without notes");
        }

        let outcome = self.voucher_repo
            .decide(voucher_id, teacher.id, decision, notes)
            .await?;
        let voucher = outcome.voucher;

        let event = match decision {
            VoucherDecision::Approve => WorkflowEvent::VoucherApproved {
                voucher: voucher.clone(),
                enrollment_id: outcome.enrollment_id,
            },
            VoucherDecision::Reject => WorkflowEvent::VoucherRejected(voucher.clone()),
        };
        self.events.publish(event).await;

        Ok(voucher)
    }

    /// Acknowledges a decision on the student's side. Repeat calls are no-ops.
    pub async fn mark_seen(&self, student: &User, voucher_id: Uuid) -> Result<Voucher> {
        let before = self.voucher_repo.find_by_id(voucher_id).await?;
        let voucher = self.voucher_repo.mark_seen(voucher_id, student.id).await?;

        if before.map(|v| !v.is_seen).unwrap_or(false) {
            self.events
                .publish(WorkflowEvent::VoucherSeen(voucher.clone()))
                .await;
        }

        Ok(voucher)
    }
}
