use chrono::{Duration, Utc};
use std::sync::Arc;
use validator::Validate;

use crate::{
    auth::AuthService,
    domain::*,
    email::{Mailer, OutgoingEmail},
    error::{AppError, Result},
    repository::{PasswordResetRepository, UserRepository},
};

/// Forgotten-password flow: mail a short code, then trade it for a new password.
pub struct PasswordResetService {
    user_repo: Arc<dyn UserRepository>,
    reset_repo: Arc<dyn PasswordResetRepository>,
    auth_service: Arc<AuthService>,
    mailer: Arc<dyn Mailer>,
    code_ttl: Duration,
}

impl PasswordResetService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        reset_repo: Arc<dyn PasswordResetRepository>,
        auth_service: Arc<AuthService>,
        mailer: Arc<dyn Mailer>,
        code_ttl: Duration,
    ) -> Self {
        Self { user_repo, reset_repo, auth_service, mailer, code_ttl }
    }

    pub async fn request(&self, req: PasswordResetRequest) -> Result<()> {
        req.validate()?;
        let email = req.email.trim().to_lowercase();

        let user = self.user_repo.find_by_email(&email).await?
            .ok_or_else(|| AppError::NotFound("No account uses this email".to_string()))?;

        let code = generate_reset_code();
        self.reset_repo.issue(&email, &code).await?;

        let message = OutgoingEmail {
            to: email.clone(),
            subject: "Aula password reset code".to_string(),
            body: format!(
                "Hello {},\n\nYour password reset code is {}.\nIt expires in {} minutes.\n\nIf you did not ask for this, ignore this message.\n",
                user.full_name,
                code,
                self.code_ttl.num_minutes(),
            ),
        };

        if let Err(e) = self.mailer.send(message).await {
            tracing::error!(user_id = %user.id, mailer = self.mailer.name(), "Failed to send reset code: {:?}", e);
            return Err(AppError::Internal("Could not send the reset email".to_string()));
        }

        tracing::info!(user_id = %user.id, "password reset code issued");
        Ok(())
    }

    /// Sets the new password and ends every session the user had open.
    pub async fn confirm(&self, req: ConfirmPasswordResetRequest) -> Result<()> {
        req.validate()?;
        let email = req.email.trim().to_lowercase();

        let reset = self.reset_repo.find_unused(&email, req.code.trim()).await?
            .ok_or_else(|| AppError::BadRequest("Invalid or already used code".to_string()))?;

        if reset.is_expired(self.code_ttl, Utc::now()) {
            return Err(AppError::BadRequest("The code has expired; request a new one".to_string()));
        }

        let user = self.user_repo.find_by_email(&email).await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        let password_hash = AuthService::hash_password(&req.new_password).await?;

        self.reset_repo.mark_used(reset.id).await?;
        self.user_repo.set_password(user.id, &password_hash).await?;

        let ended = self.auth_service.invalidate_user_sessions(user.id).await?;
        tracing::info!(user_id = %user.id, ended, "password reset");

        Ok(())
    }
}
