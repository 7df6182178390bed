use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{UpdateProfileRequest, UserRole, UserSummary},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct UserFilter {
    role: Option<UserRole>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(filter): Query<UserFilter>,
) -> Result<Json<Vec<UserSummary>>> {
    let users = state.service_context.user_service
        .list(&current.user, filter.role)
        .await?;

    Ok(Json(users))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<UserSummary>> {
    let user = state.service_context.user_service
        .get(&current.user, id)
        .await?;

    Ok(Json(user))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserSummary>> {
    let user = state.service_context.user_service
        .update(&current.user, id, req)
        .await?;

    Ok(Json(user))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.user_service
        .delete(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
