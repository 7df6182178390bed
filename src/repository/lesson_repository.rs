use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    domain::{CreateLessonRequest, Lesson, UpdateLessonRequest},
    error::{AppError, Result},
    repository::{parse_uuid, to_utc, LessonRepository},
};

#[derive(FromRow)]
struct LessonRow {
    id: String,
    course_id: String,
    title: String,
    description: String,
    sort_order: i64,
    youtube_video_id: Option<String>,
    video_duration: i64,
    pdf_files: String,
    docx_files: String,
    xlsx_files: String,
    pptx_files: String,
    audio_file: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

const LESSON_COLUMNS: &str = r#"
    id, course_id, title, description, sort_order, youtube_video_id, video_duration,
    pdf_files, docx_files, xlsx_files, pptx_files, audio_file, created_at, updated_at
"#;

pub struct SqliteLessonRepository {
    pool: SqlitePool,
}

impl SqliteLessonRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_lesson(row: LessonRow) -> Result<Lesson> {
        Ok(Lesson {
            id: parse_uuid(&row.id)?,
            course_id: parse_uuid(&row.course_id)?,
            title: row.title,
            description: row.description,
            order: row.sort_order,
            youtube_video_id: row.youtube_video_id,
            video_duration: row.video_duration,
            pdf_files: Self::parse_file_list(&row.pdf_files)?,
            docx_files: Self::parse_file_list(&row.docx_files)?,
            xlsx_files: Self::parse_file_list(&row.xlsx_files)?,
            pptx_files: Self::parse_file_list(&row.pptx_files)?,
            audio_file: row.audio_file,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    fn parse_file_list(json: &str) -> Result<Vec<String>> {
        serde_json::from_str(json)
            .map_err(|e| AppError::Database(format!("Invalid file list: {}", e)))
    }

    fn file_list_to_json(files: &[String]) -> Result<String> {
        serde_json::to_string(files).map_err(|e| AppError::Internal(e.to_string()))
    }

    fn optional_file_list_to_json(files: &Option<Vec<String>>) -> Result<Option<String>> {
        files.as_deref().map(Self::file_list_to_json).transpose()
    }
}

#[async_trait]
impl LessonRepository for SqliteLessonRepository {
    async fn create(&self, request: CreateLessonRequest) -> Result<Lesson> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        sqlx::query(
            r#"
            INSERT INTO lessons (
                id, course_id, title, description, sort_order, youtube_video_id,
                video_duration, pdf_files, docx_files, xlsx_files, pptx_files,
                audio_file, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(request.course_id.to_string())
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.order)
        .bind(&request.youtube_video_id)
        .bind(request.video_duration)
        .bind(Self::file_list_to_json(&request.pdf_files)?)
        .bind(Self::file_list_to_json(&request.docx_files)?)
        .bind(Self::file_list_to_json(&request.xlsx_files)?)
        .bind(Self::file_list_to_json(&request.pptx_files)?)
        .bind(&request.audio_file)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created lesson".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Lesson>> {
        let row = sqlx::query_as::<_, LessonRow>(
            &format!("SELECT {} FROM lessons WHERE id = ?", LESSON_COLUMNS)
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_lesson).transpose()
    }

    async fn list_by_course(&self, course_id: Uuid) -> Result<Vec<Lesson>> {
        let rows = sqlx::query_as::<_, LessonRow>(
            &format!(
                "SELECT {} FROM lessons WHERE course_id = ? ORDER BY sort_order ASC, created_at ASC",
                LESSON_COLUMNS
            )
        )
        .bind(course_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_lesson)
            .collect()
    }

    async fn update(&self, id: Uuid, update: UpdateLessonRequest) -> Result<Lesson> {
        self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))?;

        sqlx::query(
            r#"
            UPDATE lessons
            SET title = COALESCE(?, title),
                description = COALESCE(?, description),
                sort_order = COALESCE(?, sort_order),
                youtube_video_id = COALESCE(?, youtube_video_id),
                video_duration = COALESCE(?, video_duration),
                pdf_files = COALESCE(?, pdf_files),
                docx_files = COALESCE(?, docx_files),
                xlsx_files = COALESCE(?, xlsx_files),
                pptx_files = COALESCE(?, pptx_files),
                audio_file = COALESCE(?, audio_file),
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&update.title)
        .bind(&update.description)
        .bind(update.order)
        .bind(&update.youtube_video_id)
        .bind(update.video_duration)
        .bind(Self::optional_file_list_to_json(&update.pdf_files)?)
        .bind(Self::optional_file_list_to_json(&update.docx_files)?)
        .bind(Self::optional_file_list_to_json(&update.xlsx_files)?)
        .bind(Self::optional_file_list_to_json(&update.pptx_files)?)
        .bind(&update.audio_file)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated lesson".to_string())
        })
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM lessons WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
