use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

pub const RESET_CODE_LEN: usize = 6;

#[derive(Debug, Clone)]
pub struct PasswordReset {
    pub id: Uuid,
    pub email: String,
    pub is_used: bool,
    pub created_at: DateTime<Utc>,
}

impl PasswordReset {
    pub fn is_expired(&self, ttl: Duration, now: DateTime<Utc>) -> bool {
        now - self.created_at > ttl
    }
}

/// Six random decimal digits.
pub fn generate_reset_code() -> String {
    let mut rng = rand::thread_rng();
    (0..RESET_CODE_LEN)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct PasswordResetRequest {
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ConfirmPasswordResetRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6))]
    pub code: String,
    #[validate(length(min = 8))]
    pub new_password: String,
}
