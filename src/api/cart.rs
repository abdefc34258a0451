//! Cart endpoints. The actor's own active cart is the implicit subject of
//! every route here.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Actor;
use crate::carts;
use crate::domain::cart::CartView;
use crate::error::Result;
use crate::AppState;

pub async fn show(State(state): State<AppState>, actor: Actor) -> Result<Json<CartView>> {
    Ok(Json(carts::view(&state.db, actor.id).await?))
}

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

pub async fn add_item(
    State(state): State<AppState>,
    actor: Actor,
    Json(req): Json<AddItemRequest>,
) -> Result<(StatusCode, Json<CartView>)> {
    let view = carts::add_line(&state.db, actor.id, req.product_id, req.quantity).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub quantity: i32,
}

pub async fn update_item(
    State(state): State<AppState>,
    actor: Actor,
    Path(line_id): Path<Uuid>,
    Json(req): Json<UpdateItemRequest>,
) -> Result<Json<CartView>> {
    let view = carts::update_line(&state.db, actor.id, line_id, req.quantity).await?;
    Ok(Json(view))
}

pub async fn remove_item(
    State(state): State<AppState>,
    actor: Actor,
    Path(line_id): Path<Uuid>,
) -> Result<Json<CartView>> {
    let view = carts::remove_line(&state.db, actor.id, line_id).await?;
    Ok(Json(view))
}

pub async fn clear(State(state): State<AppState>, actor: Actor) -> Result<Json<CartView>> {
    Ok(Json(carts::clear(&state.db, actor.id).await?))
}
