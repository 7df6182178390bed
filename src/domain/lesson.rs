use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Lesson {
    pub id: Uuid,
    pub course_id: Uuid,
    pub title: String,
    pub description: String,
    pub order: i64,
    pub youtube_video_id: Option<String>,
    pub video_duration: i64,
    pub pdf_files: Vec<String>,
    pub docx_files: Vec<String>,
    pub xlsx_files: Vec<String>,
    pub pptx_files: Vec<String>,
    pub audio_file: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// What a viewer without content access may see of a lesson.
#[derive(Debug, Clone, Serialize)]
pub struct LessonOutline {
    pub id: Uuid,
    pub title: String,
    pub order: i64,
    pub video_duration: i64,
}

impl From<&Lesson> for LessonOutline {
    fn from(lesson: &Lesson) -> Self {
        Self {
            id: lesson.id,
            title: lesson.title.clone(),
            order: lesson.order,
            video_duration: lesson.video_duration,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateLessonRequest {
    pub course_id: Uuid,
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub order: i64,
    pub youtube_video_id: Option<String>,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub video_duration: i64,
    #[serde(default)]
    pub pdf_files: Vec<String>,
    #[serde(default)]
    pub docx_files: Vec<String>,
    #[serde(default)]
    pub xlsx_files: Vec<String>,
    #[serde(default)]
    pub pptx_files: Vec<String>,
    pub audio_file: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default, Validate)]
pub struct UpdateLessonRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub order: Option<i64>,
    pub youtube_video_id: Option<String>,
    #[validate(range(min = 0))]
    pub video_duration: Option<i64>,
    pub pdf_files: Option<Vec<String>>,
    pub docx_files: Option<Vec<String>>,
    pub xlsx_files: Option<Vec<String>>,
    pub pptx_files: Option<Vec<String>>,
    pub audio_file: Option<String>,
}
