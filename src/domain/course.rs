use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Course {
    pub id: Uuid,
    pub teacher_id: Uuid,
    pub title: String,
    pub description: String,
    pub thumbnail: Option<String>,
    pub is_paid: bool,
    /// Whole price in cents (soles × 100).
    pub price_cents: i64,
    /// The same amount as a decimal string, e.g. "50.00".
    #[serde(default, skip_deserializing)]
    pub price: String,
    pub is_published: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Renders cents as a two-decimal amount.
pub fn format_price(cents: i64) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let cents = cents.unsigned_abs();
    format!("{}{}.{:02}", sign, cents / 100, cents % 100)
}

impl Course {
    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.teacher_id == user_id
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub thumbnail: Option<String>,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default)]
    #[validate(range(min = 0))]
    pub price_cents: i64,
    #[serde(default = "default_published")]
    pub is_published: bool,
}

fn default_published() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, Default, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub thumbnail: Option<String>,
    pub is_paid: Option<bool>,
    #[validate(range(min = 0))]
    pub price_cents: Option<i64>,
    pub is_published: Option<bool>,
}

/// Catalog entry with aggregate counts.
#[derive(Debug, Clone, Serialize)]
pub struct CourseSummary {
    #[serde(flatten)]
    pub course: Course,
    pub teacher_name: String,
    pub total_lessons: i64,
    pub total_students: i64,
}
