//! Checkout endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::auth::Actor;
use crate::checkout::{self, CheckoutRequest};
use crate::error::Result;
use crate::orders::OrderDetail;
use crate::AppState;

pub async fn create(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<CheckoutRequest>,
) -> Result<(StatusCode, Json<OrderDetail>)> {
    let order = checkout::checkout(&state, actor.id, req).await?;
    Ok((StatusCode::CREATED, Json(order)))
}
