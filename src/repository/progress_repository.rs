use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{Progress, UpdateProgressRequest},
    error::{AppError, Result},
    repository::{parse_uuid, to_utc, ProgressRepository},
};

#[derive(FromRow)]
struct ProgressRow {
    id: String,
    enrollment_id: String,
    lesson_id: String,
    watched_duration: i64,
    is_completed: i32,
    last_watched_at: NaiveDateTime,
}

const PROGRESS_SELECT: &str = r#"
    SELECT p.id, p.enrollment_id, p.lesson_id, p.watched_duration, p.is_completed, p.last_watched_at
    FROM progress p
    INNER JOIN enrollments e ON e.id = p.enrollment_id
    INNER JOIN courses c ON c.id = e.course_id
    INNER JOIN lessons l ON l.id = p.lesson_id
"#;

pub struct SqliteProgressRepository {
    pool: SqlitePool,
}

impl SqliteProgressRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_progress(row: ProgressRow) -> Result<Progress> {
        Ok(Progress {
            id: parse_uuid(&row.id)?,
            enrollment_id: parse_uuid(&row.enrollment_id)?,
            lesson_id: parse_uuid(&row.lesson_id)?,
            watched_duration: row.watched_duration,
            is_completed: row.is_completed != 0,
            last_watched_at: to_utc(row.last_watched_at),
        })
    }

    async fn list_scoped(
        &self,
        owner_column: &str,
        owner_id: Uuid,
        enrollment_id: Option<Uuid>,
    ) -> Result<Vec<Progress>> {
        let rows = sqlx::query_as::<_, ProgressRow>(
            &format!(
                r#"{}
                WHERE {} = ? AND (? IS NULL OR p.enrollment_id = ?)
                ORDER BY e.enrolled_at ASC, l.sort_order ASC, l.created_at ASC
                "#,
                PROGRESS_SELECT,
                owner_column
            )
        )
        .bind(owner_id.to_string())
        .bind(enrollment_id.map(|id| id.to_string()))
        .bind(enrollment_id.map(|id| id.to_string()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_progress)
            .collect()
    }
}

#[async_trait]
impl ProgressRepository for SqliteProgressRepository {
    async fn upsert(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
        update: UpdateProgressRequest,
    ) -> Result<Progress> {
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO progress (id, enrollment_id, lesson_id, watched_duration, is_completed, last_watched_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT (enrollment_id, lesson_id)
            DO UPDATE SET watched_duration = excluded.watched_duration,
                          is_completed = excluded.is_completed,
                          last_watched_at = excluded.last_watched_at
            "#
        )
        .bind(Uuid::new_v4().to_string())
        .bind(enrollment_id.to_string())
        .bind(lesson_id.to_string())
        .bind(update.watched_duration.max(0))
        .bind(update.is_completed as i32)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find(enrollment_id, lesson_id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve saved progress".to_string())
        })
    }

    async fn find(&self, enrollment_id: Uuid, lesson_id: Uuid) -> Result<Option<Progress>> {
        let row = sqlx::query_as::<_, ProgressRow>(
            r#"
            SELECT id, enrollment_id, lesson_id, watched_duration, is_completed, last_watched_at
            FROM progress
            WHERE enrollment_id = ? AND lesson_id = ?
            "#
        )
        .bind(enrollment_id.to_string())
        .bind(lesson_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_progress).transpose()
    }

    async fn list_for_student(&self, student_id: Uuid, enrollment_id: Option<Uuid>) -> Result<Vec<Progress>> {
        self.list_scoped("e.student_id", student_id, enrollment_id).await
    }

    async fn list_for_teacher(&self, teacher_id: Uuid, enrollment_id: Option<Uuid>) -> Result<Vec<Progress>> {
        self.list_scoped("c.teacher_id", teacher_id, enrollment_id).await
    }
}
