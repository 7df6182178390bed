use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{progress_percentage, Enrollment, EnrollmentDetails},
    error::{is_unique_violation, AppError, Result},
    repository::{parse_uuid, to_utc, EnrollmentRepository},
};

#[derive(FromRow)]
struct EnrollmentRow {
    id: String,
    student_id: String,
    course_id: String,
    is_approved: i32,
    enrolled_at: NaiveDateTime,
    approved_at: Option<NaiveDateTime>,
}

#[derive(FromRow)]
struct EnrollmentDetailsRow {
    #[sqlx(flatten)]
    enrollment: EnrollmentRow,
    student_name: String,
    student_email: String,
    course_title: String,
    completed_lessons: i64,
    total_lessons: i64,
}

const DETAILS_SELECT: &str = r#"
    SELECT e.id, e.student_id, e.course_id, e.is_approved, e.enrolled_at, e.approved_at,
           s.full_name AS student_name,
           s.email AS student_email,
           c.title AS course_title,
           (SELECT COUNT(*) FROM progress p
             WHERE p.enrollment_id = e.id AND p.is_completed = 1) AS completed_lessons,
           (SELECT COUNT(*) FROM lessons l WHERE l.course_id = e.course_id) AS total_lessons
    FROM enrollments e
    INNER JOIN users s ON s.id = e.student_id
    INNER JOIN courses c ON c.id = e.course_id
"#;

pub const UNENROLLED_VOUCHER_NOTE: &str = "Closed automatically: the student was removed from the course";

pub struct SqliteEnrollmentRepository {
    pool: SqlitePool,
}

impl SqliteEnrollmentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_enrollment(row: EnrollmentRow) -> Result<Enrollment> {
        Ok(Enrollment {
            id: parse_uuid(&row.id)?,
            student_id: parse_uuid(&row.student_id)?,
            course_id: parse_uuid(&row.course_id)?,
            is_approved: row.is_approved != 0,
            enrolled_at: to_utc(row.enrolled_at),
            approved_at: row.approved_at.map(to_utc),
        })
    }

    fn row_to_details(row: EnrollmentDetailsRow) -> Result<EnrollmentDetails> {
        Ok(EnrollmentDetails {
            enrollment: Self::row_to_enrollment(row.enrollment)?,
            student_name: row.student_name,
            student_email: row.student_email,
            course_title: row.course_title,
            progress_percentage: progress_percentage(row.completed_lessons, row.total_lessons),
        })
    }
}

#[async_trait]
impl EnrollmentRepository for SqliteEnrollmentRepository {
    async fn create(&self, student_id: Uuid, course_id: Uuid, approved: bool) -> Result<Enrollment> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let approved_at = approved.then_some(now);

        // The (student_id, course_id) unique constraint is the duplicate guard.
        sqlx::query(
            r#"
            INSERT INTO enrollments (id, student_id, course_id, is_approved, enrolled_at, approved_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(student_id.to_string())
        .bind(course_id.to_string())
        .bind(approved as i32)
        .bind(now)
        .bind(approved_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEnrollment { student_id, course_id }
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created enrollment".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Enrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT id, student_id, course_id, is_approved, enrolled_at, approved_at
            FROM enrollments
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_enrollment).transpose()
    }

    async fn find_by_student_and_course(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<Enrollment>> {
        let row = sqlx::query_as::<_, EnrollmentRow>(
            r#"
            SELECT id, student_id, course_id, is_approved, enrolled_at, approved_at
            FROM enrollments
            WHERE student_id = ? AND course_id = ?
            "#
        )
        .bind(student_id.to_string())
        .bind(course_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_enrollment).transpose()
    }

    async fn list_details_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<EnrollmentDetails>> {
        let rows = sqlx::query_as::<_, EnrollmentDetailsRow>(
            &format!("{} WHERE c.teacher_id = ? ORDER BY e.enrolled_at DESC", DETAILS_SELECT)
        )
        .bind(teacher_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_details)
            .collect()
    }

    async fn list_details_by_student(&self, student_id: Uuid) -> Result<Vec<EnrollmentDetails>> {
        let rows = sqlx::query_as::<_, EnrollmentDetailsRow>(
            &format!("{} WHERE e.student_id = ? ORDER BY e.enrolled_at DESC", DETAILS_SELECT)
        )
        .bind(student_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_details)
            .collect()
    }

    async fn remove(&self, enrollment: &Enrollment, removed_by: Uuid) -> Result<u64> {
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM enrollments WHERE id = ?")
            .bind(enrollment.id.to_string())
            .execute(&mut *tx)
            .await?;

        // A pending voucher with no enrollment behind it could never be approved.
        let closed = sqlx::query(
            r#"
            UPDATE vouchers
            SET status = 'Rejected', notes = ?, reviewed_at = ?, reviewed_by = ?
            WHERE student_id = ? AND course_id = ? AND status = 'Pending'
            "#
        )
        .bind(UNENROLLED_VOUCHER_NOTE)
        .bind(now)
        .bind(removed_by.to_string())
        .bind(enrollment.student_id.to_string())
        .bind(enrollment.course_id.to_string())
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(closed.rows_affected())
    }
}
