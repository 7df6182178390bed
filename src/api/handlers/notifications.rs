use axum::{
    extract::{Extension, State},
    Json,
};

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    error::Result,
    service::Notifications,
};

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Notifications>> {
    let notifications = state.service_context.notification_service
        .for_user(&current.user)
        .await?;

    Ok(Json(notifications))
}
