use async_trait::async_trait;
use chrono::{NaiveDateTime, Utc};
use sqlx::{FromRow, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::{
    domain::{ReviewOutcome, Voucher, VoucherDecision, VoucherDetails, VoucherStatus},
    error::{is_unique_violation, AppError, Result},
    repository::{parse_uuid, to_utc, VoucherRepository},
};

#[derive(FromRow)]
struct VoucherRow {
    id: String,
    student_id: String,
    course_id: String,
    voucher_image: String,
    status: String,
    notes: String,
    is_seen: i32,
    submitted_at: NaiveDateTime,
    reviewed_at: Option<NaiveDateTime>,
    reviewed_by: Option<String>,
}

#[derive(FromRow)]
struct VoucherDetailsRow {
    #[sqlx(flatten)]
    voucher: VoucherRow,
    student_name: String,
    student_email: String,
    course_title: String,
}

const VOUCHER_COLUMNS: &str = r#"
    id, student_id, course_id, voucher_image, status, notes, is_seen,
    submitted_at, reviewed_at, reviewed_by
"#;

const DETAILS_SELECT: &str = r#"
    SELECT v.id, v.student_id, v.course_id, v.voucher_image, v.status, v.notes, v.is_seen,
           v.submitted_at, v.reviewed_at, v.reviewed_by,
           s.full_name AS student_name,
           s.email AS student_email,
           c.title AS course_title
    FROM vouchers v
    INNER JOIN users s ON s.id = v.student_id
    INNER JOIN courses c ON c.id = v.course_id
"#;

pub struct SqliteVoucherRepository {
    pool: SqlitePool,
}

impl SqliteVoucherRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_voucher(row: VoucherRow) -> Result<Voucher> {
        Ok(Voucher {
            id: parse_uuid(&row.id)?,
            student_id: parse_uuid(&row.student_id)?,
            course_id: parse_uuid(&row.course_id)?,
            voucher_image: row.voucher_image,
            status: Self::parse_status(&row.status)?,
            notes: row.notes,
            is_seen: row.is_seen != 0,
            submitted_at: to_utc(row.submitted_at),
            reviewed_at: row.reviewed_at.map(to_utc),
            reviewed_by: row.reviewed_by.as_deref().map(parse_uuid).transpose()?,
        })
    }

    fn row_to_details(row: VoucherDetailsRow) -> Result<VoucherDetails> {
        Ok(VoucherDetails {
            voucher: Self::row_to_voucher(row.voucher)?,
            student_name: row.student_name,
            student_email: row.student_email,
            course_title: row.course_title,
        })
    }

    fn parse_status(s: &str) -> Result<VoucherStatus> {
        match s {
            "Pending" => Ok(VoucherStatus::Pending),
            "Approved" => Ok(VoucherStatus::Approved),
            "Rejected" => Ok(VoucherStatus::Rejected),
            _ => Err(AppError::Database(format!("Invalid voucher status: {}", s))),
        }
    }

    async fn fetch_row(conn: &mut SqliteConnection, id: Uuid) -> Result<Option<VoucherRow>> {
        let row = sqlx::query_as::<_, VoucherRow>(
            &format!("SELECT {} FROM vouchers WHERE id = ?", VOUCHER_COLUMNS)
        )
        .bind(id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(row)
    }

    /// Works out why a guarded review update touched no rows.
    async fn review_rejection(
        conn: &mut SqliteConnection,
        voucher_id: Uuid,
        reviewer_id: Uuid,
    ) -> Result<AppError> {
        let owner: Option<(String,)> = sqlx::query_as(
            r#"
            SELECT c.teacher_id
            FROM vouchers v
            INNER JOIN courses c ON c.id = v.course_id
            WHERE v.id = ?
            "#
        )
        .bind(voucher_id.to_string())
        .fetch_optional(&mut *conn)
        .await?;

        Ok(match owner {
            None => AppError::NotFound("Voucher not found".to_string()),
            Some((teacher_id,)) if parse_uuid(&teacher_id)? != reviewer_id => AppError::NotOwner {
                user_id: reviewer_id,
                entity: "voucher",
                entity_id: voucher_id,
            },
            Some(_) => AppError::AlreadyReviewed { voucher_id },
        })
    }

    async fn list_details(&self, filter: &str, owner_id: Uuid) -> Result<Vec<VoucherDetails>> {
        let rows = sqlx::query_as::<_, VoucherDetailsRow>(
            &format!("{} {}", DETAILS_SELECT, filter)
        )
        .bind(owner_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(Self::row_to_details)
            .collect()
    }
}

#[async_trait]
impl VoucherRepository for SqliteVoucherRepository {
    async fn create(&self, student_id: Uuid, course_id: Uuid, voucher_image: &str) -> Result<Voucher> {
        let id = Uuid::new_v4();
        let now = Utc::now().naive_utc();

        // The partial unique index on pending vouchers is the duplicate guard.
        sqlx::query(
            r#"
            INSERT INTO vouchers (
                id, student_id, course_id, voucher_image, status, notes, is_seen, submitted_at
            ) VALUES (?, ?, ?, ?, ?, '', 0, ?)
            "#
        )
        .bind(id.to_string())
        .bind(student_id.to_string())
        .bind(course_id.to_string())
        .bind(voucher_image)
        .bind(VoucherStatus::Pending.as_str())
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicatePendingVoucher { student_id, course_id }
            } else {
                AppError::Database(e.to_string())
            }
        })?;

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created voucher".to_string())
        })
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Voucher>> {
        let mut conn = self.pool.acquire().await?;
        Self::fetch_row(&mut conn, id).await?
            .map(Self::row_to_voucher)
            .transpose()
    }

    async fn find_latest(&self, student_id: Uuid, course_id: Uuid) -> Result<Option<Voucher>> {
        let row = sqlx::query_as::<_, VoucherRow>(
            &format!(
                r#"
                SELECT {} FROM vouchers
                WHERE student_id = ? AND course_id = ?
                ORDER BY submitted_at DESC, rowid DESC
                LIMIT 1
                "#,
                VOUCHER_COLUMNS
            )
        )
        .bind(student_id.to_string())
        .bind(course_id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Self::row_to_voucher).transpose()
    }

    async fn list_pending_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<VoucherDetails>> {
        self.list_details(
            "WHERE c.teacher_id = ? AND v.status = 'Pending' ORDER BY v.submitted_at ASC, v.rowid ASC",
            teacher_id,
        )
        .await
    }

    async fn list_for_teacher(&self, teacher_id: Uuid) -> Result<Vec<VoucherDetails>> {
        self.list_details(
            "WHERE c.teacher_id = ? ORDER BY v.submitted_at DESC, v.rowid DESC",
            teacher_id,
        )
        .await
    }

    async fn list_for_student(&self, student_id: Uuid) -> Result<Vec<VoucherDetails>> {
        self.list_details(
            "WHERE v.student_id = ? ORDER BY v.submitted_at DESC, v.rowid DESC",
            student_id,
        )
        .await
    }

    async fn list_unseen_decisions(&self, student_id: Uuid) -> Result<Vec<VoucherDetails>> {
        self.list_details(
            r#"
            WHERE v.student_id = ?
              AND v.status IN ('Approved', 'Rejected')
              AND v.is_seen = 0
            ORDER BY v.reviewed_at DESC, v.rowid DESC
            "#,
            student_id,
        )
        .await
    }

    async fn count_pending_for_teacher(&self, teacher_id: Uuid) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM vouchers v
            INNER JOIN courses c ON c.id = v.course_id
            WHERE c.teacher_id = ? AND v.status = 'Pending'
            "#
        )
        .bind(teacher_id.to_string())
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    async fn decide(
        &self,
        voucher_id: Uuid,
        reviewer_id: Uuid,
        decision: VoucherDecision,
        notes: &str,
    ) -> Result<ReviewOutcome> {
        let now = Utc::now().naive_utc();
        let mut tx = self.pool.begin().await?;

        // Guarded write first: only a pending voucher on one of the reviewer's
        // courses matches, so a concurrent second decision updates nothing.
        let updated = sqlx::query(
            r#"
            UPDATE vouchers
            SET status = ?, notes = ?, reviewed_at = ?, reviewed_by = ?
            WHERE id = ?
              AND status = 'Pending'
              AND course_id IN (SELECT id FROM courses WHERE teacher_id = ?)
            "#
        )
        .bind(decision.resulting_status().as_str())
        .bind(notes)
        .bind(now)
        .bind(reviewer_id.to_string())
        .bind(voucher_id.to_string())
        .bind(reviewer_id.to_string())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            let err = Self::review_rejection(&mut tx, voucher_id, reviewer_id).await?;
            tx.rollback().await?;
            return Err(err);
        }

        let row = Self::fetch_row(&mut tx, voucher_id).await?
            .ok_or_else(|| AppError::Database("Voucher vanished during review".to_string()))?;
        let voucher = Self::row_to_voucher(row)?;

        let mut enrollment_id = None;

        if decision == VoucherDecision::Approve {
            let approved: Option<String> = sqlx::query_scalar(
                r#"
                UPDATE enrollments
                SET is_approved = 1, approved_at = COALESCE(approved_at, ?)
                WHERE student_id = ? AND course_id = ?
                RETURNING id
                "#
            )
            .bind(now)
            .bind(voucher.student_id.to_string())
            .bind(voucher.course_id.to_string())
            .fetch_optional(&mut *tx)
            .await?;

            // Unenrolling closes pending vouchers, so this only trips on a
            // voucher written behind the workflow's back.
            let Some(approved) = approved else {
                tx.rollback().await?;
                return Err(AppError::NoActiveEnrollment {
                    student_id: voucher.student_id,
                    course_id: voucher.course_id,
                });
            };
            enrollment_id = Some(parse_uuid(&approved)?);
        }

        tx.commit().await?;

        Ok(ReviewOutcome { voucher, enrollment_id })
    }

    async fn mark_seen(&self, voucher_id: Uuid, student_id: Uuid) -> Result<Voucher> {
        let updated = sqlx::query(
            "UPDATE vouchers SET is_seen = 1 WHERE id = ? AND student_id = ?"
        )
        .bind(voucher_id.to_string())
        .bind(student_id.to_string())
        .execute(&self.pool)
        .await?;

        let voucher = self.find_by_id(voucher_id).await?
            .ok_or_else(|| AppError::NotFound("Voucher not found".to_string()))?;

        if updated.rows_affected() == 0 {
            return Err(AppError::NotOwner {
                user_id: student_id,
                entity: "voucher",
                entity_id: voucher_id,
            });
        }

        Ok(voucher)
    }
}
