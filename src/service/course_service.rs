use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::{
        CourseRepository, EnrollmentRepository, LessonRepository, ProgressRepository, UserRepository,
    },
    uploads::UploadStore,
};

/// Lessons as shown on a course page. Viewers without access get the outline only.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum LessonListing {
    Full(Vec<Lesson>),
    Outline(Vec<LessonOutline>),
}

#[derive(Debug, Serialize)]
pub struct CourseDetail {
    #[serde(flatten)]
    pub summary: CourseSummary,
    pub is_enrolled: bool,
    pub is_approved: bool,
    pub can_access: bool,
    /// Only present on paid courses.
    #[serde(flatten)]
    pub payment: Option<PaymentContact>,
    pub lessons: LessonListing,
}

pub struct CourseService {
    user_repo: Arc<dyn UserRepository>,
    course_repo: Arc<dyn CourseRepository>,
    lesson_repo: Arc<dyn LessonRepository>,
    enrollment_repo: Arc<dyn EnrollmentRepository>,
    progress_repo: Arc<dyn ProgressRepository>,
    upload_store: Arc<dyn UploadStore>,
}

impl CourseService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        course_repo: Arc<dyn CourseRepository>,
        lesson_repo: Arc<dyn LessonRepository>,
        enrollment_repo: Arc<dyn EnrollmentRepository>,
        progress_repo: Arc<dyn ProgressRepository>,
        upload_store: Arc<dyn UploadStore>,
    ) -> Self {
        Self { user_repo, course_repo, lesson_repo, enrollment_repo, progress_repo, upload_store }
    }

    /// Teachers browse their own courses; everyone else the published catalog.
    pub async fn list(&self, user: &User) -> Result<Vec<CourseSummary>> {
        if user.is_teacher() {
            self.course_repo.list_by_teacher(user.id).await
        } else {
            self.course_repo.list_published().await
        }
    }

    /// Courses the user can work in right now: owned ones for teachers,
    /// approved enrollments for students.
    pub async fn my_courses(&self, user: &User) -> Result<Vec<CourseSummary>> {
        match user.role {
            UserRole::Teacher => self.course_repo.list_by_teacher(user.id).await,
            UserRole::Student => self.course_repo.list_approved_for_student(user.id).await,
        }
    }

    pub async fn create(&self, teacher: &User, req: CreateCourseRequest) -> Result<Course> {
        if !teacher.is_teacher() {
            return Err(AppError::Forbidden("Only teachers can create courses".to_string()));
        }
        req.validate()?;

        let course = self.course_repo.create(teacher.id, req).await?;
        tracing::info!(course_id = %course.id, teacher_id = %teacher.id, "course created");

        Ok(course)
    }

    pub async fn detail(&self, user: &User, course_id: Uuid) -> Result<CourseDetail> {
        let summary = self.course_repo.summarize(course_id).await?
            .filter(|s| s.course.is_published || s.course.is_owned_by(user.id))
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        let enrollment = self.enrollment_repo
            .find_by_student_and_course(user.id, course_id)
            .await?;
        let can_access = can_access(user, &summary.course, enrollment.as_ref());

        let lessons = self.lesson_repo.list_by_course(course_id).await?;
        let lessons = if can_access {
            LessonListing::Full(lessons)
        } else {
            LessonListing::Outline(lessons.iter().map(LessonOutline::from).collect())
        };

        let payment = if summary.course.is_paid {
            self.user_repo.find_by_id(summary.course.teacher_id).await?
                .as_ref()
                .map(PaymentContact::from)
        } else {
            None
        };

        let status = EnrollmentStatus::from_enrollment(enrollment.as_ref());

        Ok(CourseDetail {
            summary,
            is_enrolled: status.enrolled,
            is_approved: status.approved,
            can_access,
            payment,
            lessons,
        })
    }

    pub async fn update(
        &self,
        teacher: &User,
        course_id: Uuid,
        req: UpdateCourseRequest,
    ) -> Result<Course> {
        self.owned_course(teacher, course_id).await?;
        req.validate()?;

        self.course_repo.update(course_id, req).await
    }

    pub async fn delete(&self, teacher: &User, course_id: Uuid) -> Result<()> {
        self.owned_course(teacher, course_id).await?;
        self.course_repo.delete(course_id).await?;
        tracing::info!(%course_id, teacher_id = %teacher.id, "course deleted");

        Ok(())
    }

    /// Full lesson list, only for viewers who pass the access gate.
    pub async fn lessons(&self, user: &User, course_id: Uuid) -> Result<Vec<Lesson>> {
        let course = self.find_course(course_id).await?;
        self.ensure_access(user, &course).await?;

        self.lesson_repo.list_by_course(course_id).await
    }

    pub async fn lesson(&self, user: &User, lesson_id: Uuid) -> Result<Lesson> {
        let lesson = self.find_lesson(lesson_id).await?;
        let course = self.find_course(lesson.course_id).await?;
        self.ensure_access(user, &course).await?;

        Ok(lesson)
    }

    pub async fn create_lesson(&self, teacher: &User, req: CreateLessonRequest) -> Result<Lesson> {
        self.owned_course(teacher, req.course_id).await?;
        req.validate()?;

        self.lesson_repo.create(req).await
    }

    pub async fn update_lesson(
        &self,
        teacher: &User,
        lesson_id: Uuid,
        req: UpdateLessonRequest,
    ) -> Result<Lesson> {
        let lesson = self.find_lesson(lesson_id).await?;
        self.owned_course(teacher, lesson.course_id).await?;
        req.validate()?;

        self.lesson_repo.update(lesson_id, req).await
    }

    pub async fn delete_lesson(&self, teacher: &User, lesson_id: Uuid) -> Result<()> {
        let lesson = self.find_lesson(lesson_id).await?;
        self.owned_course(teacher, lesson.course_id).await?;

        self.lesson_repo.delete(lesson_id).await?;

        let files = lesson.pdf_files.iter()
            .chain(&lesson.docx_files)
            .chain(&lesson.xlsx_files)
            .chain(&lesson.pptx_files)
            .chain(lesson.audio_file.as_ref());

        for reference in files {
            if let Err(e) = self.upload_store.delete(reference).await {
                tracing::warn!(%lesson_id, %reference, "Failed to remove lesson file: {:?}", e);
            }
        }

        Ok(())
    }

    /// Records how far a student got in a lesson.
    pub async fn update_progress(
        &self,
        student: &User,
        lesson_id: Uuid,
        req: UpdateProgressRequest,
    ) -> Result<Progress> {
        let lesson = self.find_lesson(lesson_id).await?;
        let course = self.find_course(lesson.course_id).await?;

        let enrollment = self.enrollment_repo
            .find_by_student_and_course(student.id, course.id)
            .await?
            .ok_or(AppError::NoActiveEnrollment {
                student_id: student.id,
                course_id: course.id,
            })?;

        if !can_access(student, &course, Some(&enrollment)) {
            return Err(AppError::Forbidden("Course content requires an approved enrollment".to_string()));
        }

        if req.watched_duration < 0 {
            return Err(AppError::Validation("watched_duration must not be negative".to_string()));
        }

        self.progress_repo.upsert(enrollment.id, lesson_id, req).await
    }

    /// Students read their own progress rows, teachers those on their courses.
    pub async fn list_progress(&self, user: &User, enrollment_id: Option<Uuid>) -> Result<Vec<Progress>> {
        match user.role {
            UserRole::Student => self.progress_repo.list_for_student(user.id, enrollment_id).await,
            UserRole::Teacher => self.progress_repo.list_for_teacher(user.id, enrollment_id).await,
        }
    }

    async fn ensure_access(&self, user: &User, course: &Course) -> Result<()> {
        let enrollment = self.enrollment_repo
            .find_by_student_and_course(user.id, course.id)
            .await?;

        if can_access(user, course, enrollment.as_ref()) {
            Ok(())
        } else {
            Err(AppError::Forbidden("Course content requires an approved enrollment".to_string()))
        }
    }

    async fn owned_course(&self, teacher: &User, course_id: Uuid) -> Result<Course> {
        let course = self.find_course(course_id).await?;

        if !teacher.is_teacher() || !course.is_owned_by(teacher.id) {
            return Err(AppError::NotOwner {
                user_id: teacher.id,
                entity: "course",
                entity_id: course_id,
            });
        }

        Ok(course)
    }

    async fn find_course(&self, course_id: Uuid) -> Result<Course> {
        self.course_repo.find_by_id(course_id).await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))
    }

    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Lesson> {
        self.lesson_repo.find_by_id(lesson_id).await?
            .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))
    }
}
