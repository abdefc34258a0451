//! Stock ledger: the authoritative per-product available quantity.
//!
//! `debit` and `credit` are the only writers of `products.available_stock`
//! in the whole service. Both take the caller's transaction so a failed
//! order mutation rolls the stock move back with it, and `debit` locks the
//! product row so concurrent confirmations serialize on the floor check
//! instead of both reading the same stale count.

use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use crate::error::{Error, Result};

#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    name: String,
    available_stock: i32,
    minimum_stock: i32,
}

/// All-or-nothing floor check: a debit that would go negative fails without
/// touching the count.
fn check_floor(product: &str, available: i32, quantity: i32) -> Result<()> {
    if available < quantity {
        return Err(Error::InsufficientStock { product: product.to_string(), available });
    }
    Ok(())
}

/// Decrements `available_stock` by `quantity` inside `tx`, failing with
/// [`Error::InsufficientStock`] if the locked pre-debit count is short.
pub async fn debit(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    quantity: i32,
) -> Result<()> {
    let row = sqlx::query_as::<_, StockRow>(
        "SELECT name, available_stock, minimum_stock FROM products WHERE id = $1 FOR UPDATE",
    )
    .bind(product_id)
    .fetch_optional(&mut **tx)
    .await?
    .ok_or(Error::NotFound("product"))?;

    check_floor(&row.name, row.available_stock, quantity)?;

    sqlx::query(
        "UPDATE products SET available_stock = available_stock - $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    let remaining = row.available_stock - quantity;
    if remaining <= row.minimum_stock {
        tracing::warn!(
            product = %row.name,
            remaining,
            minimum = row.minimum_stock,
            "stock at or below minimum"
        );
    }

    Ok(())
}

/// Increments `available_stock` unconditionally (reversal of a prior debit).
/// Over-crediting is a caller error and is not guarded here.
pub async fn credit(
    tx: &mut Transaction<'_, Postgres>,
    product_id: Uuid,
    quantity: i32,
) -> Result<()> {
    let result = sqlx::query(
        "UPDATE products SET available_stock = available_stock + $2, updated_at = NOW() \
         WHERE id = $1",
    )
    .bind(product_id)
    .bind(quantity)
    .execute(&mut **tx)
    .await?;

    if result.rows_affected() == 0 {
        return Err(Error::NotFound("product"));
    }
    Ok(())
}

/// Non-authoritative reading used by cart-side advisory checks: name, current
/// available stock and unit price without any lock.
pub async fn on_hand(db: &PgPool, product_id: Uuid) -> Result<crate::domain::Product> {
    sqlx::query_as::<_, crate::domain::Product>("SELECT * FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(db)
        .await?
        .ok_or(Error::NotFound("product"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debit_fails_when_short() {
        let err = check_floor("Merino DK", 2, 3).unwrap_err();
        match err {
            Error::InsufficientStock { product, available } => {
                assert_eq!(product, "Merino DK");
                assert_eq!(available, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn debit_to_exactly_zero_is_allowed() {
        assert!(check_floor("Merino DK", 2, 2).is_ok());
        assert!(check_floor("Merino DK", 5, 3).is_ok());
    }

    #[test]
    fn zero_quantity_never_fails_the_floor() {
        assert!(check_floor("Merino DK", 0, 0).is_ok());
    }
}
