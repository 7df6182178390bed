use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Student {student_id} is already enrolled in course {course_id}")]
    DuplicateEnrollment { student_id: Uuid, course_id: Uuid },

    #[error("Student {student_id} has no enrollment in course {course_id}")]
    NoActiveEnrollment { student_id: Uuid, course_id: Uuid },

    #[error("Student {student_id} already has a pending voucher for course {course_id}")]
    DuplicatePendingVoucher { student_id: Uuid, course_id: Uuid },

    #[error("Enrollment of student {student_id} in course {course_id} is already approved")]
    EnrollmentAlreadyApproved { student_id: Uuid, course_id: Uuid },

    #[error("User {user_id} does not own {entity} {entity_id}")]
    NotOwner {
        user_id: Uuid,
        entity: &'static str,
        entity_id: Uuid,
    },

    #[error("Voucher {voucher_id} has already been reviewed")]
    AlreadyReviewed { voucher_id: Uuid },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable code, rendered next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::DuplicateEnrollment { .. } => "duplicate_enrollment",
            AppError::NoActiveEnrollment { .. } => "no_active_enrollment",
            AppError::DuplicatePendingVoucher { .. } => "duplicate_pending_voucher",
            AppError::EnrollmentAlreadyApproved { .. } => "enrollment_already_approved",
            AppError::NotOwner { .. } => "not_owner",
            AppError::AlreadyReviewed { .. } => "already_reviewed",
            AppError::Database(_) => "database_error",
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Forbidden(_) => "forbidden",
            AppError::BadRequest(_) => "bad_request",
            AppError::Conflict(_) => "conflict",
            AppError::Validation(_) => "validation_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::DuplicateEnrollment { .. }
            | AppError::DuplicatePendingVoucher { .. }
            | AppError::EnrollmentAlreadyApproved { .. }
            | AppError::AlreadyReviewed { .. }
            | AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NoActiveEnrollment { .. } | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotOwner { .. } | AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_message = match self {
            AppError::Database(ref msg) => {
                tracing::error!("Database error: {}", msg);
                "Database error occurred".to_string()
            }
            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                "Internal server error".to_string()
            }
            AppError::NotFound(ref msg)
            | AppError::BadRequest(ref msg)
            | AppError::Conflict(ref msg)
            | AppError::Validation(ref msg)
            | AppError::Forbidden(ref msg) => msg.clone(),
            ref other => other.to_string(),
        };

        let body = Json(json!({
            "error": error_message,
            "code": self.code(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// True when a sqlx error is a UNIQUE constraint violation.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => {
            db_err.is_unique_violation() || db_err.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}
