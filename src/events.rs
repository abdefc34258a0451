//! Notification hook.
//!
//! Downstream consumers (email sender, dashboards) subscribe to order events
//! on NATS. Publishing is fire-and-forget: the sale already committed, so a
//! broken broker must never fail the request.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::domain::order::{Order, OrderStatus};

pub const ORDER_CREATED: &str = "orders.created";
pub const ORDER_STATUS_CHANGED: &str = "orders.status_changed";
pub const ORDER_PAYMENT_PROOF: &str = "orders.payment_proof";

#[derive(Debug, Serialize)]
pub struct OrderEventPayload {
    pub order_id: Uuid,
    pub order_number: String,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_status: Option<OrderStatus>,
    pub total: Decimal,
}

impl OrderEventPayload {
    pub fn from_order(order: &Order, previous_status: Option<OrderStatus>) -> Self {
        Self {
            order_id: order.id,
            order_number: order.order_number(),
            customer_id: order.customer_id,
            status: order.status,
            previous_status,
            total: order.total,
        }
    }
}

pub async fn publish(
    nats: &Option<async_nats::Client>,
    subject: &'static str,
    payload: &OrderEventPayload,
) {
    let Some(client) = nats else { return };

    match serde_json::to_vec(payload) {
        Ok(bytes) => {
            if let Err(err) = client.publish(subject.to_string(), bytes.into()).await {
                tracing::warn!(subject, error = %err, "failed to publish order event");
            }
        }
        Err(err) => {
            tracing::warn!(subject, error = %err, "failed to serialize order event");
        }
    }
}
