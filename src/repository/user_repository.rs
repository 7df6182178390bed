use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{SqlitePool, FromRow};
use uuid::Uuid;

use crate::{
    auth::AuthService,
    domain::{CreateUserRequest, UpdateProfileRequest, User, UserRole, UserSummary},
    error::{is_unique_violation, AppError, Result},
    repository::{parse_uuid, to_utc, UserRepository},
};

// Database row struct that matches SQLite schema
#[derive(FromRow)]
struct UserRow {
    id: String,
    email: String,
    username: String,
    full_name: String,
    role: String,
    phone: Option<String>,
    avatar: Option<String>,
    yape_qr: Option<String>,
    plin_qr: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct UserSummaryRow {
    #[sqlx(flatten)]
    user: UserRow,
    enrolled_courses_count: i64,
}

const SUMMARY_SELECT: &str = r#"
    SELECT u.id, u.email, u.username, u.full_name, u.role, u.phone, u.avatar,
           u.yape_qr, u.plin_qr, u.created_at, u.updated_at,
           (SELECT COUNT(*) FROM enrollments e
             WHERE e.student_id = u.id AND e.is_approved = 1) AS enrolled_courses_count
    FROM users u
"#;

const USER_COLUMNS: &str = r#"
    id, email, username, full_name, role, phone, avatar, yape_qr, plin_qr,
    created_at, updated_at
"#;

pub struct SqliteUserRepository {
    pool: SqlitePool,
}

impl SqliteUserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_user(row: UserRow) -> Result<User> {
        Ok(User {
            id: parse_uuid(&row.id)?,
            email: row.email,
            username: row.username,
            full_name: row.full_name,
            role: Self::parse_role(&row.role)?,
            phone: row.phone,
            avatar: row.avatar,
            yape_qr: row.yape_qr,
            plin_qr: row.plin_qr,
            created_at: to_utc(row.created_at),
            updated_at: to_utc(row.updated_at),
        })
    }

    fn row_to_summary(row: UserSummaryRow) -> Result<UserSummary> {
        Ok(UserSummary {
            user: Self::row_to_user(row.user)?,
            enrolled_courses_count: row.enrolled_courses_count,
        })
    }

    fn parse_role(s: &str) -> Result<UserRole> {
        match s {
            "Student" => Ok(UserRole::Student),
            "Teacher" => Ok(UserRole::Teacher),
            _ => Err(AppError::Database(format!("Invalid user role: {}", s))),
        }
    }
}

#[async_trait]
impl UserRepository for SqliteUserRepository {
    async fn create(&self, request: CreateUserRequest) -> Result<User> {
        let id = Uuid::new_v4();
        let now_naive = Utc::now().naive_utc();
        let password_hash = AuthService::hash_password(&request.password).await?;

        sqlx::query(
            r#"
            INSERT INTO users (
                id, email, username, full_name, password_hash, role, phone,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(id.to_string())
        .bind(request.email.trim().to_lowercase())
        .bind(&request.username)
        .bind(&request.full_name)
        .bind(&password_hash)
        .bind(request.role.as_str())
        .bind(&request.phone)
        .bind(now_naive)
        .bind(now_naive)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email already registered".to_string())
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created user".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS)
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS)
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_user).transpose()
    }

    async fn password_hash(&self, email: &str) -> Result<Option<String>> {
        let hash = sqlx::query_scalar::<_, String>(
            "SELECT password_hash FROM users WHERE email = ?"
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(hash)
    }

    async fn update_profile(&self, id: Uuid, update: UpdateProfileRequest) -> Result<User> {
        self.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        sqlx::query(
            r#"
            UPDATE users
            SET full_name = COALESCE(?, full_name),
                phone = COALESCE(?, phone),
                avatar = COALESCE(?, avatar),
                yape_qr = COALESCE(?, yape_qr),
                plin_qr = COALESCE(?, plin_qr),
                updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&update.full_name)
        .bind(&update.phone)
        .bind(&update.avatar)
        .bind(&update.yape_qr)
        .bind(&update.plin_qr)
        .bind(Utc::now().naive_utc())
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated user".to_string())
        })
    }

    async fn set_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        let updated = sqlx::query("UPDATE users SET password_hash = ?, updated_at = ? WHERE id = ?")
            .bind(password_hash)
            .bind(Utc::now().naive_utc())
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }

        Ok(())
    }

    async fn list(&self, role: Option<UserRole>) -> Result<Vec<UserSummary>> {
        let rows = sqlx::query_as::<_, UserSummaryRow>(
            &format!(
                "{} WHERE (? IS NULL OR u.role = ?) ORDER BY u.created_at DESC, u.rowid DESC",
                SUMMARY_SELECT
            )
        )
        .bind(role.map(|r| r.as_str()))
        .bind(role.map(|r| r.as_str()))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_summary)
            .collect()
    }

    async fn summarize(&self, id: Uuid) -> Result<Option<UserSummary>> {
        let row = sqlx::query_as::<_, UserSummaryRow>(
            &format!("{} WHERE u.id = ?", SUMMARY_SELECT)
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_summary).transpose()
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
