//! Cart service: the per-customer staging area that a checkout converts
//! into an order.
//!
//! Stock checks here are advisory: they read the current count without
//! locking so a customer finds out early that a skein ran out. The binding
//! check happens again inside the checkout transaction.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::cart::{Cart, CartLine, CartLineView, CartView};
use crate::error::{Error, Result};
use crate::stock;

/// Returns the customer's active cart, creating an empty one if none exists.
/// The partial unique index on `(customer_id) WHERE status = 'active'` makes
/// the find-or-create race-safe.
pub async fn get_or_create_active(db: &PgPool, customer_id: Uuid) -> Result<Cart> {
    if let Some(cart) = find_active(db, customer_id).await? {
        return Ok(cart);
    }

    sqlx::query(
        "INSERT INTO carts (id, customer_id, status) VALUES ($1, $2, 'active') \
         ON CONFLICT (customer_id) WHERE status = 'active' DO NOTHING",
    )
    .bind(Uuid::now_v7())
    .bind(customer_id)
    .execute(db)
    .await?;

    let cart = sqlx::query_as::<_, Cart>(
        "SELECT * FROM carts WHERE customer_id = $1 AND status = 'active'",
    )
    .bind(customer_id)
    .fetch_one(db)
    .await?;

    Ok(cart)
}

pub async fn find_active(db: &PgPool, customer_id: Uuid) -> Result<Option<Cart>> {
    let cart = sqlx::query_as::<_, Cart>(
        "SELECT * FROM carts WHERE customer_id = $1 AND status = 'active'",
    )
    .bind(customer_id)
    .fetch_optional(db)
    .await?;
    Ok(cart)
}

pub async fn line_views(db: &PgPool, cart_id: Uuid) -> Result<Vec<CartLineView>> {
    let lines = sqlx::query_as::<_, CartLineView>(
        "SELECT cl.id, cl.cart_id, cl.product_id, p.name AS product_name, \
                cl.quantity, cl.unit_price, cl.subtotal, p.available_stock \
         FROM cart_lines cl \
         JOIN products p ON p.id = cl.product_id \
         WHERE cl.cart_id = $1 \
         ORDER BY cl.created_at",
    )
    .bind(cart_id)
    .fetch_all(db)
    .await?;
    Ok(lines)
}

/// Current cart state: cart shell, lines with catalog data, totals.
pub async fn view(db: &PgPool, customer_id: Uuid) -> Result<CartView> {
    let cart = get_or_create_active(db, customer_id).await?;
    let items = line_views(db, cart.id).await?;
    Ok(CartView::new(cart, items))
}

/// Adds `quantity` of a product to the active cart, merging into an existing
/// line if there is one. The unit price is snapshotted from the catalog at
/// first insertion and kept on later increments.
pub async fn add_line(
    db: &PgPool,
    customer_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartView> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity);
    }

    let product = stock::on_hand(db, product_id).await?;
    let cart = get_or_create_active(db, customer_id).await?;

    let mut tx = db.begin().await?;

    let existing = sqlx::query_as::<_, CartLine>(
        "SELECT * FROM cart_lines WHERE cart_id = $1 AND product_id = $2",
    )
    .bind(cart.id)
    .bind(product_id)
    .fetch_optional(&mut *tx)
    .await?;

    match existing {
        Some(line) => {
            let new_quantity = line.quantity + quantity;
            if product.available_stock < new_quantity {
                return Err(Error::InsufficientStock {
                    product: product.name,
                    available: product.available_stock,
                });
            }
            let subtotal = line.unit_price * Decimal::from(new_quantity);
            sqlx::query(
                "UPDATE cart_lines SET quantity = $2, subtotal = $3, updated_at = NOW() \
                 WHERE id = $1",
            )
            .bind(line.id)
            .bind(new_quantity)
            .bind(subtotal)
            .execute(&mut *tx)
            .await?;
        }
        None => {
            if product.available_stock < quantity {
                return Err(Error::InsufficientStock {
                    product: product.name,
                    available: product.available_stock,
                });
            }
            let subtotal = product.price * Decimal::from(quantity);
            sqlx::query(
                "INSERT INTO cart_lines (id, cart_id, product_id, quantity, unit_price, subtotal) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(Uuid::now_v7())
            .bind(cart.id)
            .bind(product_id)
            .bind(quantity)
            .bind(product.price)
            .bind(subtotal)
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;

    let items = line_views(db, cart.id).await?;
    Ok(CartView::new(cart, items))
}

/// Replaces (not adds to) a line's quantity and recomputes its subtotal.
pub async fn update_line(
    db: &PgPool,
    customer_id: Uuid,
    line_id: Uuid,
    quantity: i32,
) -> Result<CartView> {
    if quantity <= 0 {
        return Err(Error::InvalidQuantity);
    }

    let line = owned_line(db, customer_id, line_id).await?;

    let product = stock::on_hand(db, line.product_id).await?;
    if product.available_stock < quantity {
        return Err(Error::InsufficientStock {
            product: product.name,
            available: product.available_stock,
        });
    }

    let subtotal = line.unit_price * Decimal::from(quantity);
    sqlx::query(
        "UPDATE cart_lines SET quantity = $2, subtotal = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(line.id)
    .bind(quantity)
    .bind(subtotal)
    .execute(db)
    .await?;

    reload_view(db, line.cart_id).await
}

pub async fn remove_line(db: &PgPool, customer_id: Uuid, line_id: Uuid) -> Result<CartView> {
    let line = owned_line(db, customer_id, line_id).await?;

    sqlx::query("DELETE FROM cart_lines WHERE id = $1")
        .bind(line.id)
        .execute(db)
        .await?;

    reload_view(db, line.cart_id).await
}

/// Deletes every line of the customer's active cart, keeping the shell.
pub async fn clear(db: &PgPool, customer_id: Uuid) -> Result<CartView> {
    let cart = find_active(db, customer_id)
        .await?
        .ok_or(Error::NotFound("cart"))?;

    sqlx::query("DELETE FROM cart_lines WHERE cart_id = $1")
        .bind(cart.id)
        .execute(db)
        .await?;

    Ok(CartView::new(cart, Vec::new()))
}

/// Fetches a cart line scoped to the caller's active cart; lines of other
/// customers' carts are indistinguishable from missing ones.
async fn owned_line(db: &PgPool, customer_id: Uuid, line_id: Uuid) -> Result<CartLine> {
    sqlx::query_as::<_, CartLine>(
        "SELECT cl.* FROM cart_lines cl \
         JOIN carts c ON c.id = cl.cart_id \
         WHERE cl.id = $1 AND c.customer_id = $2 AND c.status = 'active'",
    )
    .bind(line_id)
    .bind(customer_id)
    .fetch_optional(db)
    .await?
    .ok_or(Error::NotFound("cart line"))
}

async fn reload_view(db: &PgPool, cart_id: Uuid) -> Result<CartView> {
    let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE id = $1")
        .bind(cart_id)
        .fetch_one(db)
        .await?;
    let items = line_views(db, cart_id).await?;
    Ok(CartView::new(cart, items))
}
