//! Order endpoints: listing, detail, lifecycle mutations.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use super::PaginatedResponse;
use crate::auth::Actor;
use crate::checkout::{self, DirectSaleRequest};
use crate::domain::order::OrderStatus;
use crate::error::{Error, Result};
use crate::orders::{self, OrderDetail, OrderFilter, OrderSummary};
use crate::AppState;

/// Admin listing with filters and pagination.
pub async fn list(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<OrderFilter>,
) -> Result<Json<PaginatedResponse<OrderSummary>>> {
    actor.require_admin()?;
    let (data, total, page) = orders::list(&state.db, &filter).await?;
    Ok(Json(PaginatedResponse { data, total, page }))
}

#[derive(Debug, Deserialize)]
pub struct MineFilter {
    pub status: Option<OrderStatus>,
}

/// The calling customer's own orders.
pub async fn mine(
    State(state): State<AppState>,
    actor: Actor,
    Query(filter): Query<MineFilter>,
) -> Result<Json<Vec<OrderSummary>>> {
    Ok(Json(orders::list_for_customer(&state.db, actor.id, filter.status).await?))
}

pub async fn show(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
) -> Result<Json<OrderDetail>> {
    let detail = orders::detail(&state.db, id).await?;
    actor.ensure_can_manage(detail.order.customer_id)?;
    Ok(Json(detail))
}

/// Point-of-sale direct sale (admin).
pub async fn create_direct_sale(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<DirectSaleRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    actor.require_admin()?;
    let order = checkout::direct_sale(&state, &actor.audit_label(), req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
    #[validate(length(max = 500))]
    pub note: Option<String>,
}

pub async fn update_status(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<OrderDetail>> {
    req.validate().map_err(|e| Error::Validation(e.to_string()))?;
    let detail = orders::transition(&state, &actor, id, req.status, req.note.as_deref()).await?;
    Ok(Json(detail))
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CancelRequest {
    #[validate(length(max = 500))]
    pub reason: Option<String>,
}

pub async fn cancel(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<CancelRequest>,
) -> Result<Json<OrderDetail>> {
    req.validate().map_err(|e| Error::Validation(e.to_string()))?;
    let detail = orders::cancel(&state, &actor, id, req.reason.as_deref()).await?;
    Ok(Json(detail))
}

#[derive(Debug, Deserialize, Validate)]
pub struct AttachProofRequest {
    #[validate(length(min = 1, max = 1000))]
    pub payment_proof_url: String,
    #[validate(length(max = 50))]
    pub operation_code: Option<String>,
}

pub async fn attach_payment_proof(
    State(state): State<AppState>,
    actor: Actor,
    Path(id): Path<Uuid>,
    Json(req): Json<AttachProofRequest>,
) -> Result<Json<OrderDetail>> {
    req.validate().map_err(|e| Error::Validation(e.to_string()))?;
    let detail = orders::attach_payment_proof(
        &state,
        &actor,
        id,
        &req.payment_proof_url,
        req.operation_code.as_deref(),
    )
    .await?;
    Ok(Json(detail))
}
