use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    api::{middleware::auth::CurrentUser, state::AppState},
    domain::{SubmitVoucherRequest, Voucher, VoucherDecision, VoucherDetails},
    error::Result,
};

#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// Teachers pass `history=true` to include decided vouchers.
    #[serde(default)]
    history: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct DecisionRequest {
    #[serde(default)]
    notes: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<VoucherDetails>>> {
    let vouchers = &state.service_context.voucher_service;

    let list = if params.history && current.user.is_teacher() {
        vouchers.list_history(&current.user).await?
    } else {
        vouchers.list_for_user(&current.user).await?
    };

    Ok(Json(list))
}

pub async fn submit(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Json(req): Json<SubmitVoucherRequest>,
) -> Result<(StatusCode, Json<Voucher>)> {
    let voucher = state.service_context.voucher_service
        .submit(&current.user, req.course_id, &req.voucher_image)
        .await?;

    Ok((StatusCode::CREATED, Json(voucher)))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Voucher>> {
    let voucher = state.service_context.voucher_service
        .get(&current.user, id)
        .await?;

    Ok(Json(voucher))
}

pub async fn approve(
    state: State<AppState>,
    current: Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionRequest>>,
) -> Result<Json<Voucher>> {
    decide(state, current, id, VoucherDecision::Approve, body).await
}

pub async fn reject(
    state: State<AppState>,
    current: Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    body: Option<Json<DecisionRequest>>,
) -> Result<Json<Voucher>> {
    decide(state, current, id, VoucherDecision::Reject, body).await
}

async fn decide(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    id: Uuid,
    decision: VoucherDecision,
    body: Option<Json<DecisionRequest>>,
) -> Result<Json<Voucher>> {
    let Json(req) = body.unwrap_or_default();

    let voucher = state.service_context.voucher_service
        .decide(&current.user, id, decision, req.notes.as_deref())
        .await?;

    Ok(Json(voucher))
}

pub async fn mark_as_seen(
    State(state): State<AppState>,
    Extension(current): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Voucher>> {
    let voucher = state.service_context.voucher_service
        .mark_seen(&current.user, id)
        .await?;

    Ok(Json(voucher))
}
