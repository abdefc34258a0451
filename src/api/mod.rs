//! HTTP surface.

pub mod cart;
pub mod checkout;
pub mod orders;

use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> {
    pub data: Vec<T>,
    pub total: i64,
    pub page: u32,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/cart", get(cart::show).delete(cart::clear))
        .route("/api/v1/cart/items", post(cart::add_item))
        .route(
            "/api/v1/cart/items/:line_id",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/api/v1/checkout", post(checkout::create))
        .route("/api/v1/orders", get(orders::list).post(orders::create_direct_sale))
        .route("/api/v1/orders/mine", get(orders::mine))
        .route("/api/v1/orders/:id", get(orders::show))
        .route("/api/v1/orders/:id/status", put(orders::update_status))
        .route("/api/v1/orders/:id/cancel", post(orders::cancel))
        .route("/api/v1/orders/:id/payment-proof", post(orders::attach_payment_proof))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "healthy", "service": "skein-commerce" }))
}
