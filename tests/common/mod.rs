#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use aula::{
    auth::AuthService,
    domain::{Course, CreateCourseRequest, CreateLessonRequest, CreateUserRequest, Lesson, User, UserRole},
    email::{Mailer, OutgoingEmail},
    error::Result as AppResult,
    events::{AuditLogSubscriber, EventDispatcher},
    repository::{CourseRepository, LessonRepository, UserRepository},
    service::ServiceContext,
    uploads::LocalUploadStore,
};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions},
    SqlitePool,
};
use uuid::Uuid;

/// A single shared connection keeps the in-memory database alive for the whole test.
pub async fn test_pool() -> anyhow::Result<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None::<std::time::Duration>)
        .max_lifetime(None::<std::time::Duration>)
        .connect("sqlite::memory:")
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// An on-disk database so several connections can contend for the write lock.
pub async fn file_pool(max_connections: u32) -> anyhow::Result<SqlitePool> {
    let path = std::env::temp_dir().join(format!("aula-test-{}.db", Uuid::new_v4()));
    let options = SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .busy_timeout(std::time::Duration::from_secs(10));

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

/// Keeps every message instead of sending it.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
}

impl RecordingMailer {
    pub fn last(&self) -> Option<OutgoingEmail> {
        self.sent.lock().unwrap().last().cloned()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    fn name(&self) -> &str {
        "recording"
    }

    async fn send(&self, email: OutgoingEmail) -> AppResult<()> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub async fn test_context() -> anyhow::Result<Arc<ServiceContext>> {
    context_with(test_pool().await?, Arc::new(RecordingMailer::default())).await
}

pub async fn context_with(pool: SqlitePool, mailer: Arc<dyn Mailer>) -> anyhow::Result<Arc<ServiceContext>> {
    let auth_service = Arc::new(AuthService::new(pool.clone(), 24));
    let events = Arc::new(EventDispatcher::new());
    events.subscribe(Arc::new(AuditLogSubscriber)).await;

    let upload_root = std::env::temp_dir().join(format!("aula-test-{}", Uuid::new_v4()));
    let upload_store = Arc::new(LocalUploadStore::new(upload_root, 1024 * 1024));

    Ok(Arc::new(ServiceContext::new(
        pool,
        auth_service,
        events,
        upload_store,
        mailer,
        chrono::Duration::minutes(10),
    )))
}

pub async fn create_user(ctx: &ServiceContext, role: UserRole, name: &str) -> anyhow::Result<User> {
    let user = ctx.user_repo.create(CreateUserRequest {
        email: format!("{}@example.com", name),
        username: name.to_string(),
        full_name: format!("{} Test", name),
        password: "password123".to_string(),
        role,
        phone: None,
    }).await?;

    Ok(user)
}

pub async fn create_course(
    ctx: &ServiceContext,
    teacher: &User,
    title: &str,
    price_cents: Option<i64>,
) -> anyhow::Result<Course> {
    let course = ctx.course_repo.create(teacher.id, CreateCourseRequest {
        title: title.to_string(),
        description: String::new(),
        thumbnail: None,
        is_paid: price_cents.is_some(),
        price_cents: price_cents.unwrap_or(0),
        is_published: true,
    }).await?;

    Ok(course)
}

pub async fn create_lesson(ctx: &ServiceContext, course: &Course, title: &str, order: i64) -> anyhow::Result<Lesson> {
    let lesson = ctx.lesson_repo.create(CreateLessonRequest {
        course_id: course.id,
        title: title.to_string(),
        description: String::new(),
        order,
        youtube_video_id: Some("dQw4w9WgXcQ".to_string()),
        video_duration: 300,
        pdf_files: vec!["/uploads/documents/guia.pdf".to_string()],
        docx_files: Vec::new(),
        xlsx_files: Vec::new(),
        pptx_files: Vec::new(),
        audio_file: None,
    }).await?;

    Ok(lesson)
}
