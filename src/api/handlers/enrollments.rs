use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{Enrollment, EnrollmentDetails},
    error::Result,
    service::EnrollmentState,
};

pub async fn enroll(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<Enrollment>> {
    let enrollment = state.service_context.enrollment_service
        .enroll(&current.user, course_id)
        .await?;

    Ok(Json(enrollment))
}

pub async fn status(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(course_id): Path<Uuid>,
) -> Result<Json<EnrollmentState>> {
    let status = state.service_context.enrollment_service
        .state_for(&current.user, course_id)
        .await?;

    Ok(Json(status))
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
) -> Result<Json<Vec<EnrollmentDetails>>> {
    let enrollments = state.service_context.enrollment_service
        .list_for_user(&current.user)
        .await?;

    Ok(Json(enrollments))
}

pub async fn unenroll(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service_context.enrollment_service
        .unenroll(&current.user, id)
        .await?;

    Ok(StatusCode::NO_CONTENT)
}
