use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Course, CourseSummary, CreateCourseRequest, Lesson, UpdateCourseRequest},
    error::Result,
    service::CourseDetail,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<CourseSummary>>> {
    let courses = state.service_context.course_service.list(&current.user).await?;
    Ok(Json(courses))
}

pub async fn mine(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<CourseSummary>>> {
    let courses = state.service_context.course_service.my_courses(&current.user).await?;
    Ok(Json(courses))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<CreateCourseRequest>,
) -> Result<(StatusCode, Json<Course>)> {
    let course = state.service_context.course_service
        .create(&current.user, req)
        .await?;

    Ok((StatusCode::CREATED, Json(course)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<CourseDetail>> {
    let detail = state.service_context.course_service
        .detail(&current.user, id)
        .await?;

    Ok(Json(detail))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateCourseRequest>,
) -> Result<Json<Course>> {
    let course = state.service_context.course_service
        .update(&current.user, id, req)
        .await?;

    Ok(Json(course))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.course_service
        .delete(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn lessons(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Lesson>>> {
    let lessons = state.service_context.course_service
        .lessons(&current.user, id)
        .await?;

    Ok(Json(lessons))
}
