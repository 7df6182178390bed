use axum::{
    extract::{Extension, State},
    Json,
};
use validator::Validate;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{UpdateProfileRequest, User},
    error::Result,
    repository::UserRepository,
};

pub async fn get(Extension(current): Extension<CurrentUser>) -> Json<User> {
    Json(current.user)
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<User>> {
    req.validate()?;

    let user = state.service_context.user_repo
        .update_profile(current.user.id, req)
        .await?;

    Ok(Json(user))
}
