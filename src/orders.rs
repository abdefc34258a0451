//! Order state machine and order queries.
//!
//! Every transition runs in one transaction holding a row lock on the order,
//! so the legality check, the stock side effect and the status write are
//! atomic relative to any concurrent mutation of the same order.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::auth::Actor;
use crate::domain::order::{
    transition_credits_stock, transition_debits_stock, Order, OrderEvent, OrderLine,
    OrderLineView, OrderStatus, PaymentMethod,
};
use crate::domain::proof::normalize_proof_url;
use crate::error::{Error, Result};
use crate::events::{self, OrderEventPayload};
use crate::stock;
use crate::AppState;

/// Full order representation returned by mutation and detail endpoints.
#[derive(Debug, Serialize)]
pub struct OrderDetail {
    pub order_number: String,
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderLineView>,
    pub history: Vec<OrderEvent>,
}

/// List-row representation: the order plus its derived number.
#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub order_number: String,
    #[serde(flatten)]
    pub order: Order,
}

impl From<Order> for OrderSummary {
    fn from(order: Order) -> Self {
        Self { order_number: order.order_number(), order }
    }
}

pub async fn detail(db: &PgPool, order_id: Uuid) -> Result<OrderDetail> {
    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::NotFound("order"))?;

    let items = sqlx::query_as::<_, OrderLineView>(
        "SELECT ol.id, ol.product_id, p.name AS product_name, \
                ol.quantity, ol.unit_price, ol.subtotal \
         FROM order_lines ol \
         JOIN products p ON p.id = ol.product_id \
         WHERE ol.order_id = $1 \
         ORDER BY ol.created_at",
    )
    .bind(order_id)
    .fetch_all(db)
    .await?;

    let history = sqlx::query_as::<_, OrderEvent>(
        "SELECT * FROM order_events WHERE order_id = $1 ORDER BY occurred_at",
    )
    .bind(order_id)
    .fetch_all(db)
    .await?;

    Ok(OrderDetail { order_number: order.order_number(), order, items, history })
}

#[derive(Debug, Deserialize)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    pub payment_method: Option<PaymentMethod>,
    pub customer_id: Option<Uuid>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

/// Filtered, newest-first page of orders plus the unpaged match count.
pub async fn list(db: &PgPool, filter: &OrderFilter) -> Result<(Vec<OrderSummary>, i64, u32)> {
    let page = filter.page.unwrap_or(1).max(1);
    let per_page = filter.per_page.unwrap_or(20).clamp(1, 100);

    const WHERE: &str = "($1::order_status IS NULL OR status = $1) \
         AND ($2::payment_method IS NULL OR payment_method = $2) \
         AND ($3::uuid IS NULL OR customer_id = $3) \
         AND ($4::timestamptz IS NULL OR created_at >= $4) \
         AND ($5::timestamptz IS NULL OR created_at <= $5)";

    let orders = sqlx::query_as::<_, Order>(&format!(
        "SELECT * FROM orders WHERE {WHERE} ORDER BY created_at DESC LIMIT $6 OFFSET $7"
    ))
    .bind(filter.status)
    .bind(filter.payment_method)
    .bind(filter.customer_id)
    .bind(filter.from)
    .bind(filter.to)
    .bind(i64::from(per_page))
    .bind(i64::from((page - 1) * per_page))
    .fetch_all(db)
    .await?;

    let (total,): (i64,) =
        sqlx::query_as(&format!("SELECT COUNT(*) FROM orders WHERE {WHERE}"))
            .bind(filter.status)
            .bind(filter.payment_method)
            .bind(filter.customer_id)
            .bind(filter.from)
            .bind(filter.to)
            .fetch_one(db)
            .await?;

    Ok((orders.into_iter().map(OrderSummary::from).collect(), total, page))
}

/// A customer's own orders, newest first.
pub async fn list_for_customer(
    db: &PgPool,
    customer_id: Uuid,
    status: Option<OrderStatus>,
) -> Result<Vec<OrderSummary>> {
    let orders = sqlx::query_as::<_, Order>(
        "SELECT * FROM orders \
         WHERE customer_id = $1 AND ($2::order_status IS NULL OR status = $2) \
         ORDER BY created_at DESC",
    )
    .bind(customer_id)
    .bind(status)
    .fetch_all(db)
    .await?;

    Ok(orders.into_iter().map(OrderSummary::from).collect())
}

/// Drives an order along the transition graph (administrator operation).
///
/// `pending -> confirmed` debits stock per line; `confirmed|in_process ->
/// cancelled` credits it back. A debit failure aborts the whole transition
/// with the status unchanged.
pub async fn transition(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    new_status: OrderStatus,
    note: Option<&str>,
) -> Result<OrderDetail> {
    actor.require_admin()?;

    let mut tx = state.db.begin().await?;

    let order = lock_order(&mut tx, order_id).await?;
    let from = order.status;
    if !from.can_transition_to(new_status) {
        return Err(Error::IllegalTransition { from, to: new_status });
    }

    apply_stock_effects(&mut tx, &order, from, new_status).await?;

    let updated = set_status(&mut tx, order_id, new_status).await?;
    record_event(&mut tx, order_id, Some(from), new_status, &actor.audit_label(), note).await?;

    tx.commit().await?;

    tracing::info!(
        order = %updated.order_number(),
        from = %from,
        to = %new_status,
        "order status changed"
    );
    events::publish(
        &state.nats,
        events::ORDER_STATUS_CHANGED,
        &OrderEventPayload::from_order(&updated, Some(from)),
    )
    .await;

    detail(&state.db, order_id).await
}

/// Constrained cancellation available to the owning customer as well as
/// administrators, and only while the order is still `pending` or
/// `confirmed`.
pub async fn cancel(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    reason: Option<&str>,
) -> Result<OrderDetail> {
    let mut tx = state.db.begin().await?;

    let order = lock_order(&mut tx, order_id).await?;
    actor.ensure_can_manage(order.customer_id)?;

    let from = order.status;
    if !matches!(from, OrderStatus::Pending | OrderStatus::Confirmed) {
        return Err(Error::IllegalTransition { from, to: OrderStatus::Cancelled });
    }

    apply_stock_effects(&mut tx, &order, from, OrderStatus::Cancelled).await?;

    let updated = set_status(&mut tx, order_id, OrderStatus::Cancelled).await?;
    let note = reason.unwrap_or(if actor.is_admin() {
        "cancelled by administrator"
    } else {
        "cancelled by customer"
    });
    record_event(
        &mut tx,
        order_id,
        Some(from),
        OrderStatus::Cancelled,
        &actor.audit_label(),
        Some(note),
    )
    .await?;

    tx.commit().await?;

    tracing::info!(order = %updated.order_number(), from = %from, reason = note, "order cancelled");
    events::publish(
        &state.nats,
        events::ORDER_STATUS_CHANGED,
        &OrderEventPayload::from_order(&updated, Some(from)),
    )
    .await;

    detail(&state.db, order_id).await
}

/// Stores a normalized payment-proof reference on the order. Status is not
/// touched; the operator reviews the receipt before confirming.
pub async fn attach_payment_proof(
    state: &AppState,
    actor: &Actor,
    order_id: Uuid,
    proof_url: &str,
    operation_code: Option<&str>,
) -> Result<OrderDetail> {
    let proof_url = normalize_proof_url(proof_url, &state.config.trusted_media_host)?;

    let order = sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1")
        .bind(order_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or(Error::NotFound("order"))?;
    actor.ensure_can_manage(order.customer_id)?;

    let updated = sqlx::query_as::<_, Order>(
        "UPDATE orders SET payment_proof_url = $2, \
                           operation_code = COALESCE($3, operation_code), \
                           updated_at = NOW() \
         WHERE id = $1 RETURNING *",
    )
    .bind(order_id)
    .bind(&proof_url)
    .bind(operation_code)
    .fetch_one(&state.db)
    .await?;

    tracing::info!(order = %updated.order_number(), "payment proof attached");
    events::publish(
        &state.nats,
        events::ORDER_PAYMENT_PROOF,
        &OrderEventPayload::from_order(&updated, None),
    )
    .await;

    detail(&state.db, order_id).await
}

async fn lock_order(tx: &mut Transaction<'_, Postgres>, order_id: Uuid) -> Result<Order> {
    sqlx::query_as::<_, Order>("SELECT * FROM orders WHERE id = $1 FOR UPDATE")
        .bind(order_id)
        .fetch_optional(&mut **tx)
        .await?
        .ok_or(Error::NotFound("order"))
}

async fn set_status(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    status: OrderStatus,
) -> Result<Order> {
    let order = sqlx::query_as::<_, Order>(
        "UPDATE orders SET status = $2, updated_at = NOW() WHERE id = $1 RETURNING *",
    )
    .bind(order_id)
    .bind(status)
    .fetch_one(&mut **tx)
    .await?;
    Ok(order)
}

async fn apply_stock_effects(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
    from: OrderStatus,
    to: OrderStatus,
) -> Result<()> {
    if !transition_debits_stock(from, to) && !transition_credits_stock(from, to) {
        return Ok(());
    }

    let lines = sqlx::query_as::<_, OrderLine>(
        "SELECT id, order_id, product_id, quantity, unit_price, subtotal \
         FROM order_lines WHERE order_id = $1",
    )
    .bind(order.id)
    .fetch_all(&mut **tx)
    .await?;

    for line in &lines {
        if transition_debits_stock(from, to) {
            stock::debit(tx, line.product_id, line.quantity).await?;
        } else {
            stock::credit(tx, line.product_id, line.quantity).await?;
        }
    }
    Ok(())
}

/// Appends one row to the order's status history.
pub(crate) async fn record_event(
    tx: &mut Transaction<'_, Postgres>,
    order_id: Uuid,
    from: Option<OrderStatus>,
    to: OrderStatus,
    actor: &str,
    note: Option<&str>,
) -> Result<()> {
    sqlx::query(
        "INSERT INTO order_events (id, order_id, from_status, to_status, actor, note) \
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(Uuid::now_v7())
    .bind(order_id)
    .bind(from)
    .bind(to)
    .bind(actor)
    .bind(note)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
