use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;

use crate::{
    api::state::AppState,
    auth::SESSION_COOKIE,
    domain::User,
    error::AppError,
    repository::UserRepository,
};

/// The authenticated caller, resolved from the session on every request.
#[derive(Clone)]
pub struct CurrentUser {
    pub user: User,
}

/// Session token from the cookie, falling back to a bearer header for API clients.
pub fn session_token(jar: &CookieJar, request: &Request) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, &request).ok_or(AppError::Unauthorized)?;

    let session = state.service_context.auth_service
        .validate_session(&token)
        .await?
        .ok_or(AppError::Unauthorized)?;

    let user = state.service_context.user_repo
        .find_by_id(session.user_id)
        .await?
        .ok_or(AppError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser { user });

    Ok(next.run(request).await)
}
