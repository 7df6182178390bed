pub mod course_service;
pub mod enrollment_service;
pub mod notification_service;
pub mod password_reset_service;
pub mod user_service;
pub mod voucher_service;

use chrono::Duration;
use std::sync::Arc;
use sqlx::SqlitePool;
use crate::repository::*;
use crate::auth::AuthService;
use crate::email::Mailer;
use crate::events::EventDispatcher;
use crate::uploads::UploadStore;
use course_service::CourseService;
use enrollment_service::EnrollmentService;
use notification_service::NotificationService;
use password_reset_service::PasswordResetService;
use user_service::UserService;
use voucher_service::VoucherService;

pub use course_service::{CourseDetail, LessonListing};
pub use enrollment_service::EnrollmentState;
pub use notification_service::Notifications;

pub struct ServiceContext {
    pub user_repo: Arc<dyn UserRepository>,
    pub course_repo: Arc<dyn CourseRepository>,
    pub lesson_repo: Arc<dyn LessonRepository>,
    pub enrollment_repo: Arc<dyn EnrollmentRepository>,
    pub voucher_repo: Arc<dyn VoucherRepository>,
    pub progress_repo: Arc<dyn ProgressRepository>,
    pub password_reset_repo: Arc<dyn PasswordResetRepository>,
    pub auth_service: Arc<AuthService>,
    pub events: Arc<EventDispatcher>,
    pub upload_store: Arc<dyn UploadStore>,
    pub mailer: Arc<dyn Mailer>,
    pub user_service: Arc<UserService>,
    pub password_reset_service: Arc<PasswordResetService>,
    pub course_service: Arc<CourseService>,
    pub enrollment_service: Arc<EnrollmentService>,
    pub voucher_service: Arc<VoucherService>,
    pub notification_service: Arc<NotificationService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        db_pool: SqlitePool,
        auth_service: Arc<AuthService>,
        events: Arc<EventDispatcher>,
        upload_store: Arc<dyn UploadStore>,
        mailer: Arc<dyn Mailer>,
        reset_code_ttl: Duration,
    ) -> Self {
        let user_repo: Arc<dyn UserRepository> = Arc::new(SqliteUserRepository::new(db_pool.clone()));
        let course_repo: Arc<dyn CourseRepository> = Arc::new(SqliteCourseRepository::new(db_pool.clone()));
        let lesson_repo: Arc<dyn LessonRepository> = Arc::new(SqliteLessonRepository::new(db_pool.clone()));
        let enrollment_repo: Arc<dyn EnrollmentRepository> = Arc::new(SqliteEnrollmentRepository::new(db_pool.clone()));
        let voucher_repo: Arc<dyn VoucherRepository> = Arc::new(SqliteVoucherRepository::new(db_pool.clone()));
        let progress_repo: Arc<dyn ProgressRepository> = Arc::new(SqliteProgressRepository::new(db_pool.clone()));
        let password_reset_repo: Arc<dyn PasswordResetRepository> =
            Arc::new(SqlitePasswordResetRepository::new(db_pool.clone()));

        let user_service = Arc::new(UserService::new(user_repo.clone()));
        let password_reset_service = Arc::new(PasswordResetService::new(
            user_repo.clone(),
            password_reset_repo.clone(),
            auth_service.clone(),
            mailer.clone(),
            reset_code_ttl,
        ));

        let course_service = Arc::new(CourseService::new(
            user_repo.clone(),
            course_repo.clone(),
            lesson_repo.clone(),
            enrollment_repo.clone(),
            progress_repo.clone(),
            upload_store.clone(),
        ));
        let enrollment_service = Arc::new(EnrollmentService::new(
            course_repo.clone(),
            enrollment_repo.clone(),
            voucher_repo.clone(),
            events.clone(),
        ));
        let voucher_service = Arc::new(VoucherService::new(
            course_repo.clone(),
            enrollment_repo.clone(),
            voucher_repo.clone(),
            events.clone(),
        ));
        let notification_service = Arc::new(NotificationService::new(voucher_repo.clone()));

        Self {
            user_repo,
            course_repo,
            lesson_repo,
            enrollment_repo,
            voucher_repo,
            progress_repo,
            password_reset_repo,
            auth_service,
            events,
            upload_store,
            mailer,
            user_service,
            password_reset_service,
            course_service,
            enrollment_service,
            voucher_service,
            notification_service,
            db_pool,
        }
    }
}
