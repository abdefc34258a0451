//! Checkout orchestration: converting a cart into an order, plus the
//! point-of-sale direct path.
//!
//! Web checkout creates the order in `pending` without touching stock; the
//! debit happens when an administrator confirms the order. In-person sales
//! are settled on the spot, so the direct path debits immediately and the
//! order is born `completed`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::domain::cart::{self, Cart, CartLineView};
use crate::domain::order::{Order, OrderStatus, PaymentMethod, SalesChannel};
use crate::domain::proof::normalize_proof_url;
use crate::error::{Error, Result};
use crate::events::{self, OrderEventPayload};
use crate::orders::{self, OrderDetail};
use crate::stock;
use crate::AppState;

#[derive(Debug, Deserialize, Validate)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    #[validate(length(max = 255))]
    pub shipping_address: Option<String>,
    #[validate(length(max = 20))]
    pub contact_phone: Option<String>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    #[validate(length(max = 1000))]
    pub payment_proof_url: Option<String>,
    #[validate(length(max = 50))]
    pub operation_code: Option<String>,
}

/// Converts the customer's active cart into a `pending` order.
///
/// Everything from the stock re-check to the cart conversion runs in one
/// transaction; any failure leaves no order, no order lines, no stock change
/// and the cart untouched.
pub async fn checkout(
    state: &AppState,
    customer_id: Uuid,
    req: CheckoutRequest,
) -> Result<OrderDetail> {
    req.validate().map_err(|e| Error::Validation(e.to_string()))?;

    // Proof validation happens before anything is written.
    let proof_url = match req.payment_proof_url.as_deref() {
        Some(raw) => Some(normalize_proof_url(raw, &state.config.trusted_media_host)?),
        None => None,
    };

    let mut tx = state.db.begin().await?;

    let cart = sqlx::query_as::<_, Cart>(
        "SELECT * FROM carts WHERE customer_id = $1 AND status = 'active'",
    )
    .bind(customer_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(Error::EmptyCart)?;

    let lines = sqlx::query_as::<_, CartLineView>(
        "SELECT cl.id, cl.cart_id, cl.product_id, p.name AS product_name, \
                cl.quantity, cl.unit_price, cl.subtotal, p.available_stock \
         FROM cart_lines cl \
         JOIN products p ON p.id = cl.product_id \
         WHERE cl.cart_id = $1 \
         ORDER BY cl.created_at",
    )
    .bind(cart.id)
    .fetch_all(&mut *tx)
    .await?;

    if lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    // Authoritative re-check: any short line aborts the whole checkout.
    for line in &lines {
        if line.available_stock < line.quantity {
            return Err(Error::InsufficientStock {
                product: line.product_name.clone(),
                available: line.available_stock,
            });
        }
    }

    let subtotal = cart::total(&lines);

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, customer_id, status, payment_method, channel, \
                             shipping_address, contact_phone, notes, payment_proof_url, \
                             operation_code, subtotal, discount, total) \
         VALUES ($1, $2, 'pending', $3, 'web', $4, $5, $6, $7, $8, $9, 0, $9) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(customer_id)
    .bind(req.payment_method)
    .bind(&req.shipping_address)
    .bind(&req.contact_phone)
    .bind(&req.notes)
    .bind(&proof_url)
    .bind(&req.operation_code)
    .bind(subtotal)
    .fetch_one(&mut *tx)
    .await?;

    for line in &lines {
        sqlx::query(
            "INSERT INTO order_lines (id, order_id, product_id, quantity, unit_price, subtotal) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(line.product_id)
        .bind(line.quantity)
        .bind(line.unit_price)
        .bind(line.subtotal)
        .execute(&mut *tx)
        .await?;
    }

    orders::record_event(
        &mut tx,
        order.id,
        None,
        OrderStatus::Pending,
        &format!("customer:{customer_id}"),
        None,
    )
    .await?;

    sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("UPDATE carts SET status = 'converted', updated_at = NOW() WHERE id = $1")
        .bind(cart.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        order = %order.order_number(),
        customer = %customer_id,
        total = %order.total,
        "order placed from cart"
    );
    events::publish(
        &state.nats,
        events::ORDER_CREATED,
        &OrderEventPayload::from_order(&order, None),
    )
    .await;

    orders::detail(&state.db, order.id).await
}

#[derive(Debug, Deserialize, Validate)]
pub struct DirectSaleRequest {
    pub customer_id: Uuid,
    #[validate(length(min = 1))]
    pub items: Vec<DirectSaleItem>,
    pub payment_method: PaymentMethod,
    pub channel: Option<SalesChannel>,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub discount: Option<Decimal>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DirectSaleItem {
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
}

/// Point-of-sale path: explicit lines, immediate stock debit, order created
/// directly in `completed` (in-person sales are settled on the spot).
pub async fn direct_sale(
    state: &AppState,
    actor_label: &str,
    req: DirectSaleRequest,
) -> Result<OrderDetail> {
    req.validate().map_err(|e| Error::Validation(e.to_string()))?;

    for item in &req.items {
        if item.quantity <= 0 {
            return Err(Error::InvalidQuantity);
        }
        if item.unit_price < Decimal::ZERO {
            return Err(Error::Validation("unit_price cannot be negative".into()));
        }
    }
    let discount = req.discount.unwrap_or(Decimal::ZERO);
    if discount < Decimal::ZERO {
        return Err(Error::Validation("discount cannot be negative".into()));
    }

    let subtotal: Decimal = req
        .items
        .iter()
        .map(|i| i.unit_price * Decimal::from(i.quantity))
        .sum();
    if discount > subtotal {
        return Err(Error::Validation("discount exceeds subtotal".into()));
    }
    let total = subtotal - discount;
    let channel = req.channel.unwrap_or(SalesChannel::InStore);

    let mut tx = state.db.begin().await?;

    // Locked floor check and debit per line; one short product rolls back
    // the whole sale.
    for item in &req.items {
        stock::debit(&mut tx, item.product_id, item.quantity).await?;
    }

    let order = sqlx::query_as::<_, Order>(
        "INSERT INTO orders (id, customer_id, status, payment_method, channel, notes, \
                             subtotal, discount, total) \
         VALUES ($1, $2, 'completed', $3, $4, $5, $6, $7, $8) \
         RETURNING *",
    )
    .bind(Uuid::now_v7())
    .bind(req.customer_id)
    .bind(req.payment_method)
    .bind(channel)
    .bind(&req.notes)
    .bind(subtotal)
    .bind(discount)
    .bind(total)
    .fetch_one(&mut *tx)
    .await?;

    for item in &req.items {
        sqlx::query(
            "INSERT INTO order_lines (id, order_id, product_id, quantity, unit_price, subtotal) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(Uuid::now_v7())
        .bind(order.id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .bind(item.unit_price * Decimal::from(item.quantity))
        .execute(&mut *tx)
        .await?;
    }

    orders::record_event(&mut tx, order.id, None, OrderStatus::Completed, actor_label, None)
        .await?;

    tx.commit().await?;

    tracing::info!(
        order = %order.order_number(),
        customer = %req.customer_id,
        total = %order.total,
        "direct sale recorded"
    );
    events::publish(
        &state.nats,
        events::ORDER_CREATED,
        &OrderEventPayload::from_order(&order, None),
    )
    .await;

    orders::detail(&state.db, order.id).await
}
