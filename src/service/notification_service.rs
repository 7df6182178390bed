use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    domain::{User, UserRole, VoucherDetails},
    error::Result,
    repository::VoucherRepository,
};

/// What the bell icon shows, depending on who is asking.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Notifications {
    Teacher { pending_review_count: i64 },
    Student { unseen_decisions: Vec<VoucherDetails> },
}

pub struct NotificationService {
    voucher_repo: Arc<dyn VoucherRepository>,
}

impl NotificationService {
    pub fn new(voucher_repo: Arc<dyn VoucherRepository>) -> Self {
        Self { voucher_repo }
    }

    pub async fn pending_review_count(&self, teacher_id: Uuid) -> Result<i64> {
        self.voucher_repo.count_pending_for_teacher(teacher_id).await
    }

    pub async fn unseen_decisions(&self, student_id: Uuid) -> Result<Vec<VoucherDetails>> {
        self.voucher_repo.list_unseen_decisions(student_id).await
    }

    pub async fn for_user(&self, user: &User) -> Result<Notifications> {
        Ok(match user.role {
            UserRole::Teacher => Notifications::Teacher {
                pending_review_count: self.pending_review_count(user.id).await?,
            },
            UserRole::Student => Notifications::Student {
                unseen_decisions: self.unseen_decisions(user.id).await?,
            },
        })
    }
}
