//! Skein Commerce
//!
//! Self-hosted retail backend for a yarn & craft store.
//!
//! ## Features
//! - Per-customer shopping cart with unit-price snapshots
//! - Checkout converting a cart into a pending order atomically
//! - Order lifecycle state machine with stock debits/credits in lockstep
//! - Point-of-sale direct sales
//! - Stock ledger with a hard floor at zero
//! - Order event notifications over NATS

use std::sync::Arc;

pub mod api;
pub mod auth;
pub mod carts;
pub mod checkout;
pub mod config;
pub mod domain;
pub mod error;
pub mod events;
pub mod orders;
pub mod stock;

pub use config::AppConfig;
pub use error::{Error, Result};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub nats: Option<async_nats::Client>,
    pub config: Arc<AppConfig>,
}
