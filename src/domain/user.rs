use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub full_name: String,
    pub role: UserRole,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub yape_qr: Option<String>,
    pub plin_qr: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    pub fn is_teacher(&self) -> bool {
        self.role == UserRole::Teacher
    }

    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Student,
    Teacher,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::Student => "Student",
            UserRole::Teacher => "Teacher",
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 150))]
    pub username: String,
    #[validate(length(min = 1, max = 300))]
    pub full_name: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: UserRole,
    pub phone: Option<String>,
}

/// Profile fields a user may change about themselves. Role is fixed at registration.
#[derive(Debug, Clone, Serialize, Deserialize, Default, Validate)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 300))]
    pub full_name: Option<String>,
    pub phone: Option<String>,
    pub avatar: Option<String>,
    pub yape_qr: Option<String>,
    pub plin_qr: Option<String>,
}

/// A user as listed on the teacher's management screen.
#[derive(Debug, Clone, Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: User,
    /// Approved enrollments only.
    pub enrolled_courses_count: i64,
}

/// Where students send the payment for a teacher's paid course.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentContact {
    pub teacher_phone: Option<String>,
    pub teacher_yape_qr: Option<String>,
    pub teacher_plin_qr: Option<String>,
}

impl From<&User> for PaymentContact {
    fn from(teacher: &User) -> Self {
        Self {
            teacher_phone: teacher.phone.clone(),
            teacher_yape_qr: teacher.yape_qr.clone(),
            teacher_plin_qr: teacher.plin_qr.clone(),
        }
    }
}
