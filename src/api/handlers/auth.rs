use axum::{
    extract::{Request, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::CookieJar;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    api::{middleware::auth::session_token, state::AppState},
    auth::AuthService,
    domain::{ConfirmPasswordResetRequest, CreateUserRequest, PasswordResetRequest, User},
    error::{AppError, Result},
    repository::UserRepository,
};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub message: String,
    pub token: String,
    pub user: User,
}

pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, CookieJar, Json<LoginResponse>)> {
    req.validate()?;

    let user = state.service_context.user_repo.create(req).await?;
    tracing::info!(user_id = %user.id, role = user.role.as_str(), "user registered");

    let (jar, token) = start_session(&state, jar, &user).await?;

    Ok((
        StatusCode::CREATED,
        jar,
        Json(LoginResponse {
            message: "Registration successful".to_string(),
            token,
            user,
        }),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>)> {
    let email = req.email.trim().to_lowercase();
    let user_repo = &state.service_context.user_repo;

    let password_hash = user_repo
        .password_hash(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    if !AuthService::verify_password(&req.password, &password_hash).await? {
        tracing::debug!("Failed login attempt for {}", email);
        return Err(AppError::Unauthorized);
    }

    let user = user_repo
        .find_by_email(&email)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let (jar, token) = start_session(&state, jar, &user).await?;

    Ok((
        jar,
        Json(LoginResponse {
            message: "Login successful".to_string(),
            token,
            user,
        }),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    request: Request,
) -> Result<(CookieJar, StatusCode)> {
    if let Some(token) = session_token(&jar, &request) {
        let _ = state.service_context.auth_service
            .invalidate_session(&token)
            .await;
    }

    let jar = jar.add(AuthService::create_logout_cookie());

    Ok((jar, StatusCode::NO_CONTENT))
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    state.service_context.password_reset_service
        .request(req)
        .await?;

    Ok(Json(MessageResponse {
        message: "A reset code was sent to your email".to_string(),
    }))
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(req): Json<ConfirmPasswordResetRequest>,
) -> Result<Json<MessageResponse>> {
    state.service_context.password_reset_service
        .confirm(req)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed. You can log in now".to_string(),
    }))
}

async fn start_session(state: &AppState, jar: CookieJar, user: &User) -> Result<(CookieJar, String)> {
    let auth_service = &state.service_context.auth_service;

    let (_session, token) = auth_service.create_session(user.id).await?;
    let cookie = auth_service.create_session_cookie(&token, state.settings.auth.secure_cookies);

    Ok((jar.add(cookie), token))
}
