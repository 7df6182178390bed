use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use uuid::Uuid;
use crate::domain::*;
use crate::error::{AppError, Result};

pub mod user_repository;
pub mod course_repository;
pub mod lesson_repository;
pub mod enrollment_repository;
pub mod voucher_repository;
pub mod progress_repository;
pub mod password_reset_repository;

pub use user_repository::SqliteUserRepository;
pub use course_repository::SqliteCourseRepository;
pub use lesson_repository::SqliteLessonRepository;
pub use enrollment_repository::{SqliteEnrollmentRepository, UNENROLLED_VOUCHER_NOTE};
pub use voucher_repository::SqliteVoucherRepository;
pub use progress_repository::SqliteProgressRepository;
pub use password_reset_repository::SqlitePasswordResetRepository;

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: CreateUserRequest) -> Result<User>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;
    async fn password_hash(&self, email: &str) -> Result<Option<String>>;
    async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<User>;
    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()>;
    async fn list(&self, role: Option<UserRole>) -> Result<Vec<UserSummary>>;
    async fn summarize(&self, id: Uuid) -> Result<Option<UserSummary>>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait CourseRepository: Send + Sync {
    async fn create(&self, teacher_id: Uuid, course: CreateCourseRequest) -> Result<Course>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>>;
    async fn summarize(&self, id: Uuid) -> Result<Option<CourseSummary>>;
    async fn list_published(&self) -> Result<Vec<CourseSummary>>;
    async fn list_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<CourseSummary>>;
    async fn list_approved_for_student(&self, student_id: Uuid) -> Result<Vec<CourseSummary>>;
    async fn update(&self, id: Uuid, update: UpdateCourseRequest) -> Result<Course>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait LessonRepository: Send + Sync {
    async fn create(&self, lesson: CreateLessonRequest) -> Result<Lesson>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lesson>>;
    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<Lesson>>;
    async fn update(&self, id: Uuid, update: UpdateLessonRequest) -> Result<Lesson>;
    async fn delete(&self, id: Uuid) -> Result<()>;
}

#[async_trait]
pub trait EnrollmentRepository: Send + Sync {
    /// Fails with `DuplicateEnrollment` when the pair already has a row.
    async fn create(&self, student_id: Uuid, course_id: Uuid, approved: bool) -> Result<Enrollment>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>>;
    async fn find_by_student_and_course(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<Enrollment>>;
    async fn list_details_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<EnrollmentDetails>>;
    async fn list_details_by_student(&self, student_id: Uuid) -> Result<Vec<EnrollmentDetails>>;
    /// Deletes the enrollment and closes any pending voucher for the pair as
    /// rejected. Returns how many vouchers were closed.
    async fn remove(&self, enrollment: &Enrollment, removed_by: Uuid) -> Result<u64>;
}

#[async_trait]
pub trait VoucherRepository: Send + Sync {
    /// Fails with `DuplicatePendingVoucher` when the pair already has a pending voucher.
    async fn create(&self, student_id: Uuid, course_id: Uuid, voucher_image: &str) -> Result<Voucher>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Voucher>>;
    async fn find_latest(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<Voucher>>;
    async fn list_pending_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<VoucherDetails>>;
    async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<VoucherDetails>>;
    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<VoucherDetails>>;
    async fn list_unseen_decisions(&self, student_id: Uuid) -> Result<Vec<VoucherDetails>>;
    async fn count_pending_for_teacher(&self, teacher_id: Uuid) -> Result<i64>;
    /// Applies a review decision atomically. Approval also approves the enrollment.
    async fn decide(
        &self,
        voucher_id: Uuid,
        reviewer_id: Uuid,
        decision: VoucherDecision,
        notes: &str,
    ) -> Result<ReviewOutcome>;
    async fn mark_seen(&self, voucher_id: Uuid, student_id: Uuid) -> Result<Voucher>;
}

#[async_trait]
pub trait ProgressRepository: Send + Sync {
    async fn upsert(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
        update: UpdateProgressRequest,
    ) -> Result<Progress>;
    async fn find(&self, enrollment_id: Uuid, lesson_id: Uuid) -> Result<Option<Progress>>;
    /// Progress on the student's own enrollments, optionally narrowed to one.
    async fn list_for_student(&self, student_id: Uuid, enrollment_id: Option<Uuid>) -> Result<Vec<Progress>>;
    /// Progress on enrollments in the teacher's courses, optionally narrowed to one.
    async fn list_for_teacher(&self, teacher_id: Uuid, enrollment_id: Option<Uuid>) -> Result<Vec<Progress>>;
}

#[async_trait]
pub trait PasswordResetRepository: Send + Sync {
    /// Stores a fresh code for the address, discarding its earlier unused codes.
    async fn issue(&self, email: &str, code: &str) -> Result<PasswordReset>;
    async fn find_unused(&self, email: &str, code: &str) -> Result<Option<PasswordReset>>;
    /// Fails with `BadRequest` when the code was already consumed.
    async fn mark_used(&self, id: Uuid) -> Result<()>;
}

pub(crate) fn parse_uuid(s: &str) -> Result<Uuid> {
    Uuid::parse_str(s).map_err(|e| AppError::Database(e.to_string()))
}

pub(crate) fn to_utc(dt: NaiveDateTime) -> DateTime<Utc> {
    DateTime::from_naive_utc_and_offset(dt, Utc)
}
