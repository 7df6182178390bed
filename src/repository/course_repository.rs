use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{format_price, Course, CourseSummary, CreateCourseRequest, UpdateCourseRequest},
    error::{AppError, Result},
    repository::{parse_uuid, to_utc, CourseRepository},
};

#[derive(FromRow)]
struct CourseRow {
    id: String,
    teacher_id: String,
    title: String,
    description: String,
    thumbnail: Option<String>,
    is_paid: i32,
    price_cents: i64,
    is_published: i32,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct CourseSummaryRow {
    #[sqlx(flatten)]
    course: CourseRow,
    teacher_name: String,
    total_lessons: i64,
    total_students: i64,
}

// Students counted are those with access, matching what the catalog advertises.
const SUMMARY_SELECT: &str = r#"
    SELECT c.id, c.teacher_id, c.title, c.description, c.thumbnail, c.is_paid,
           c.price_cents, c.is_published, c.created_at, c.updated_at,
           u.full_name AS teacher_name,
           (SELECT COUNT(*) FROM lessons l WHERE l.course_id = c.id) AS total_lessons,
           (SELECT COUNT(*) FROM enrollments e
             WHERE e.course_id = c.id AND e.is_approved = 1) AS total_students
    FROM courses c
    INNER JOIN users u ON u.id = c.teacher_id
"#;

pub struct SqliteCourseRepository {
    pool: SqlitePool,
}

impl SqliteCourseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_course(row: CourseRow) -> Result<Course> {
        Ok(Course {
            id: parse_uuid(&row.id)?,
            teacher_id: parse_uuid(&row.teacher_id)?,
            title: row.title,
            description: row.description,
            thumbnail: row.thumbnail,
            is_paid: row.is_paid != 0,
            price_cents: row.price_cents,
            price: format_price(row.price_cents),
            is_published: row.is_published != 0,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    fn row_to_summary(row: CourseSummaryRow) -> Result<CourseSummary> {
        Ok(CourseSummary {
            course: Self::row_to_course(row.course)?,
            teacher_name: row.teacher_name,
            total_lessons: row.total_lessons,
            total_students: row.total_students,
        })
    }

    /// Free courses store a zero price whatever the caller sent.
    fn normalized_price(is_paid: bool, price_cents: i64) -> i64 {
        if is_paid { price_cents } else { 0 }
    }
}

#[async_trait]
impl CourseRepository for SqliteCourseRepository {
    async fn create(&self, teacher_id: Uuid, request: CreateCourseRequest) -> Result<Course> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO courses (
                id, teacher_id, title, description, thumbnail, is_paid,
                price_cents, is_published, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(teacher_id.to_string())
        .bind(&request.title)
        .bind(&request.description)
        .bind(&request.thumbnail)
        .bind(request.is_paid as i32)
        .bind(Self::normalized_price(request.is_paid, request.price_cents))
        .bind(request.is_published as i32)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created course".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Course>> {
        let row = sqlx::query_as::<_, CourseRow>(
            r#"
            SELECT id, teacher_id, title, description, thumbnail, is_paid,
                   price_cents, is_published, created_at, updated_at
            FROM courses
            WHERE id = ?
            "#
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_course).transpose()
    }

    async fn summarize(&self, id: Uuid) -> Result<Option<CourseSummary>> {
        let row = sqlx::query_as::<_, CourseSummaryRow>(
            &format!("{} WHERE c.id = ?", SUMMARY_SELECT)
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_summary).transpose()
    }

    async fn list_published(&self) -> Result<Vec<CourseSummary>> {
        let rows = sqlx::query_as::<_, CourseSummaryRow>(
            &format!("{} WHERE c.is_published = 1 ORDER BY c.created_at DESC", SUMMARY_SELECT)
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_summary)
            .collect()
    }

    async fn list_by_teacher(&self, teacher_id: Uuid) -> Result<Vec<CourseSummary>> {
        let rows = sqlx::query_as::<_, CourseSummaryRow>(
            &format!("{} WHERE c.teacher_id = ? ORDER BY c.created_at DESC", SUMMARY_SELECT)
        )
        .bind(teacher_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_summary)
            .collect()
    }

    async fn list_approved_for_student(&self, student_id: Uuid) -> Result<Vec<CourseSummary>> {
        let rows = sqlx::query_as::<_, CourseSummaryRow>(
            &format!(
                r#"{}
                INNER JOIN enrollments en ON en.course_id = c.id
                WHERE en.student_id = ? AND en.is_approved = 1
                ORDER BY en.enrolled_at DESC
                "#,
                SUMMARY_SELECT
            )
        )
        .bind(student_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_summary)
            .collect()
    }

    async fn update(&self, id: Uuid, update: UpdateCourseRequest) -> Result<Course> {
        let existing = self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Course not found".to_string()))?;

        let is_paid = update.is_paid.unwrap_or(existing.is_paid);
        let price_cents = Self::normalized_price(
            is_paid,
            update.price_cents.unwrap_or(existing.price_cents),
        );
        let is_published = update.is_published.unwrap_or(existing.is_published);
        let now = Utc::now().naive_utc();

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE courses
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                thumbnail = COALESCE(?, thumbnail),
                is_paid = ?,
                price_cents = ?,
                is_published = ?,
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(&update.thumbnail)
        .bind(is_paid as i32)
        .bind(price_cents)
        .bind(is_published as i32)
        .bind(now)
        .bind(id.to_string())
        .execute(&mut *tx)
        .await?;

        // A course that became free approves everyone already enrolled.
        if existing.is_paid && !is_paid {
            let approved = sqlx::query(
                r#"
                UPDATE enrollments
                SET is_approved = 1, approved_at = ?
                WHERE course_id = ? AND is_approved = 0
                "#
            )
            .bind(now)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

            tracing::info!(
                "Course {} is now free; approved {} waiting enrollments",
                id,
                approved.rows_affected()
            );
        }

        tx.commit().await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated course".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM courses WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
