use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    repository::UserRepository,
};

/// Account management for teachers: browse, edit and remove users.
pub struct UserService {
    repo: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(repo: Arc<dyn UserRepository>) -> Self {
        Self { repo }
    }

    pub async fn list(&self, teacher: &User, role: Option<UserRole>) -> Result<Vec<UserSummary>> {
        Self::ensure_teacher(teacher)?;
        self.repo.list(role).await
    }

    pub async fn get(&self, teacher: &User, id: Uuid) -> Result<UserSummary> {
        Self::ensure_teacher(teacher)?;
        self.find(id).await
    }

    pub async fn update(
        &self,
        teacher: &User,
        id: Uuid,
        request: UpdateProfileRequest,
    ) -> Result<UserSummary> {
        Self::ensure_teacher(teacher)?;
        request.validate()?;

        self.repo.update_profile(id, request).await?;
        tracing::info!(user_id = %id, by = %teacher.id, "user updated by teacher");

        self.find(id).await
    }

    pub async fn delete(&self, teacher: &User, id: Uuid) -> Result<()> {
        Self::ensure_teacher(teacher)?;

        if id == teacher.id {
            return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
        }

        let target = self.find(id).await?;
        self.repo.delete(id).await?;

        tracing::info!(
            user_id = %id,
            role = target.user.role.as_str(),
            by = %teacher.id,
            "user deleted"
        );

        Ok(())
    }

    fn ensure_teacher(user: &User) -> Result<()> {
        if user.is_teacher() {
            Ok(())
        } else {
            Err(AppError::Forbidden("Only teachers manage users".to_string()))
        }
    }

    async fn find(&self, id: Uuid) -> Result<UserSummary> {
        self.repo.summarize(id).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }
}
