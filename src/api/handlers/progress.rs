use axum::{
    extract::{Extension, Query, State},
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::Progress,
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ProgressParams {
    enrollment: Option<Uuid>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ProgressParams>,
) -> Result<Json<Vec<Progress>>> {
    let progress = state.service_context.course_service
        .list_progress(&current.user, params.enrollment)
        .await?;

    Ok(Json(progress))
}
