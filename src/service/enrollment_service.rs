use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::*,
    error::{AppError, Result},
    events::{EventDispatcher, WorkflowEvent},
    repository::{CourseRepository, EnrollmentRepository, VoucherRepository},
};

/// Where a student stands in a course, as returned to clients.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct EnrollmentState {
    #[serde(flatten)]
    pub status: EnrollmentStatus,
    pub state: ApprovalState,
    pub can_access: bool,
    pub can_submit_voucher: bool,
}

pub struct EnrollmentService {
    course_repo: Arc<dyn CourseRepository>,
    enrollment_repo: Arc<dyn EnrollmentRepository>,
    voucher_repo: Arc<dyn VoucherRepository>,
    events: Arc<EventDispatcher>,
}

impl EnrollmentService {
    pub fn new(
        course_repo: Arc<dyn CourseRepository>,
        enrollment_repo: Arc<dyn EnrollmentRepository>,
        voucher_repo: Arc<dyn VoucherRepository>,
        events: Arc<EventDispatcher>,
    ) -> Self {
        Self { course_repo, enrollment_repo, voucher_repo, events }
    }

    /// Enrolls a student. Free courses are approved on the spot; paid courses
    /// wait for an approved voucher.
    pub async fn enroll(&self, student: &User, course_id: Uuid) -> Result<Enrollment> {
        if !student.is_student() {
            return Err(AppError::Forbidden("Only students can enroll in courses".to_string()));
        }

        let course = self.course_repo.find_by_id(course_id).await?
            .filter(|c| c.is_published)
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        let enrollment = self.enrollment_repo
            .create(student.id, course.id, !course.is_paid)
            .await?;

        self.events
            .publish(WorkflowEvent::StudentEnrolled(enrollment.clone()))
            .await;

        Ok(enrollment)
    }

    /// Removes a student from a course. Only the owning teacher may do this.
    /// Voucher history stays behind for audit; a voucher still pending is
    /// closed as rejected so it leaves the review queue.
    pub async fn unenroll(&self, teacher: &User, enrollment_id: Uuid) -> Result<()> {
        let enrollment = self.enrollment_repo.find_by_id(enrollment_id).await?
            .ok_or_else(|| AppError::NotFound("Enrollment not found".to_string()))?;

        let course = self.course_repo.find_by_id(enrollment.course_id).await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        if !teacher.is_teacher() || !course.is_owned_by(teacher.id) {
            return Err(AppError::NotOwner {
                user_id: teacher.id,
                entity: "enrollment",
                entity_id: enrollment_id,
            });
        }

        let closed = self.enrollment_repo.remove(&enrollment, teacher.id).await?;
        if closed > 0 {
            tracing::info!(%enrollment_id, closed, "closed pending vouchers on unenroll");
        }

        self.events
            .publish(WorkflowEvent::StudentUnenrolled { enrollment, by: teacher.id })
            .await;

        Ok(())
    }

    pub async fn get_status(&self, student_id: Uuid, course_id: Uuid) -> Result<EnrollmentStatus> {
        let enrollment = self.enrollment_repo
            .find_by_student_and_course(student_id, course_id)
            .await?;

        Ok(EnrollmentStatus::from_enrollment(enrollment.as_ref()))
    }

    pub async fn state_for(&self, user: &User, course_id: Uuid) -> Result<EnrollmentState> {
        let course = self.course_repo.find_by_id(course_id).await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        let enrollment = self.enrollment_repo
            .find_by_student_and_course(user.id, course_id)
            .await?;
        let latest_voucher = self.voucher_repo.find_latest(user.id, course_id).await?;

        let state = ApprovalState::derive(&course, enrollment.as_ref(), latest_voucher.as_ref());

        Ok(EnrollmentState {
            status: EnrollmentStatus::from_enrollment(enrollment.as_ref()),
            state,
            can_access: can_access(user, &course, enrollment.as_ref()),
            can_submit_voucher: user.is_student() && state.can_submit_voucher(),
        })
    }

    /// Teachers see enrollments in the courses they own; students see their own.
    pub async fn list_for_user(&self, user: &User) -> Result<Vec<EnrollmentDetails>> {
        match user.role {
            UserRole::Teacher => self.enrollment_repo.list_details_by_teacher(user.id).await,
            UserRole::Student => self.enrollment_repo.list_details_by_student(user.id).await,
        }
    }
}
