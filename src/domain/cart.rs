//! Cart records: a customer's staging area before checkout.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "cart_status", rename_all = "snake_case")]
pub enum CartStatus {
    Active,
    Converted,
    Abandoned,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Cart {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub status: CartStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Cart line joined with live catalog data. `available_stock` is the stock
/// reading at query time; it is advisory until checkout re-checks it.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct CartLineView {
    pub id: Uuid,
    pub cart_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
    pub available_stock: i32,
}

pub fn total(lines: &[CartLineView]) -> Decimal {
    lines.iter().map(|l| l.subtotal).sum()
}

pub fn total_items(lines: &[CartLineView]) -> i64 {
    lines.iter().map(|l| i64::from(l.quantity)).sum()
}

/// Cart state returned by every cart endpoint.
#[derive(Clone, Debug, Serialize)]
pub struct CartView {
    pub cart: Cart,
    pub items: Vec<CartLineView>,
    pub total_items: i64,
    pub total: Decimal,
}

impl CartView {
    pub fn new(cart: Cart, items: Vec<CartLineView>) -> Self {
        let total = total(&items);
        let total_items = total_items(&items);
        Self { cart, items, total_items, total }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn line(quantity: i32, unit_price: Decimal) -> CartLineView {
        CartLineView {
            id: Uuid::now_v7(),
            cart_id: Uuid::now_v7(),
            product_id: Uuid::now_v7(),
            product_name: "Alpaca Sock 4ply".into(),
            quantity,
            unit_price,
            subtotal: unit_price * Decimal::from(quantity),
            available_stock: 99,
        }
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(total(&[]), Decimal::ZERO);
        assert_eq!(total_items(&[]), 0);
    }

    #[test]
    fn total_is_sum_of_line_subtotals() {
        let lines = vec![line(2, dec("10.00")), line(3, dec("4.50"))];
        assert_eq!(total(&lines), dec("33.50"));
        assert_eq!(total_items(&lines), 5);
    }

    #[test]
    fn view_carries_derived_totals() {
        let cart = Cart {
            id: Uuid::now_v7(),
            customer_id: Uuid::now_v7(),
            status: CartStatus::Active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let view = CartView::new(cart, vec![line(2, dec("10.00"))]);
        assert_eq!(view.total, dec("20.00"));
        assert_eq!(view.total_items, 2);
    }
}
