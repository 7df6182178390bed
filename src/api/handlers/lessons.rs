use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{CreateLessonRequest, Lesson, Progress, UpdateLessonRequest, UpdateProgressRequest},
    error::Result,
};

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateLessonRequest>,
) -> Result<(StatusCode, Json<Lesson>)> {
    let lesson = state.service_context.course_service
        .create_lesson(&current.user, req)
        .await?;

    Ok((StatusCode::CREATED, Json(lesson)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Lesson>> {
    let lesson = state.service_context.course_service
        .lesson(&current.user, id)
        .await?;

    Ok(Json(lesson))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateLessonRequest>,
) -> Result<Json<Lesson>> {
    let lesson = state.service_context.course_service
        .update_lesson(&current.user, id, req)
        .await?;

    Ok(Json(lesson))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.course_service
        .delete_lesson(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn update_progress(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateProgressRequest>,
) -> Result<Json<Progress>> {
    let progress = state.service_context.course_service
        .update_progress(&current.user, id, req)
        .await?;

    Ok(Json(progress))
}
