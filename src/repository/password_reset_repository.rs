use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::{
    auth::session::hash_token,
    domain::PasswordReset,
    error::{AppError, Result},
    repository::{parse_uuid, to_utc, PasswordResetRepository},
};

#[derive(FromRow)]
struct PasswordResetRow {
    id: String,
    email: String,
    is_used: i32,
    created_at: NaiveDateTime,
}

pub struct SqlitePasswordResetRepository {
    pool: SqlitePool,
}

impl SqlitePasswordResetRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_reset(row: PasswordResetRow) -> Result<PasswordReset> {
        Ok(PasswordReset {
            id: parse_uuid(&row.id)?,
            email: row.email,
            is_used: row.is_used != 0,
            created_at: to_utc(row.created_at),
        })
    }
}

#[async_trait]
impl PasswordResetRepository for SqlitePasswordResetRepository {
    async fn issue(&self, email: &str, code: &str) -> Result<PasswordReset> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        // Only the newest code for an address is ever valid
        sqlx::query("DELETE FROM password_resets WHERE email = ? AND is_used = 0")
            .bind(email)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO password_resets (id, email, code_hash, is_used, created_at)
            VALUES (?, ?, ?, 0, ?)
            "#
        )
        .bind(id.to_string())
        .bind(email)
        .bind(hash_token(code))
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(PasswordReset {
            id,
            email: email.to_string(),
            is_used: false,
            created_at: to_utc(now),
        })
    }

    async fn find_unused(&self, email: &str, code: &str) -> Result<Option<PasswordReset>> {
        let row = sqlx::query_as::<_, PasswordResetRow>(
            r#"
            SELECT id, email, is_used, created_at
            FROM password_resets
            WHERE email = ? AND code_hash = ? AND is_used = 0
            ORDER BY created_at DESC
            LIMIT 1
            "#
        )
        .bind(email)
        .bind(hash_token(code))
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_reset).transpose()
    }

    async fn mark_used(&self, id: Uuid) -> Result<()> {
        let updated = sqlx::query("UPDATE password_resets SET is_used = 1 WHERE id = ? AND is_used = 0")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::BadRequest("Invalid or already used code".to_string()));
        }

        Ok(())
    }
}
