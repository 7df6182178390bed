use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Progress {
    pub id: Uuid,
    pub enrollment_id: Uuid,
    pub lesson_id: Uuid,
    pub watched_duration: i64,
    pub is_completed: bool,
    pub last_watched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateProgressRequest {
    #[serde(default)]
    pub watched_duration: i64,
    #[serde(default)]
    pub is_completed: bool,
}

/// Completed lessons as a percentage of the course, rounded to two decimals.
pub fn progress_percentage(completed: i64, total: i64) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    let pct = (completed as f64 / total as f64) * 100.0;
    (pct * 100.0).round() / 100.0
}
