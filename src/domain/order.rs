//! Order records and the status transition graph.
//!
//! An order is immutable once placed except for its status, payment-proof
//! fields and `updated_at`. Status changes are constrained to the graph in
//! [`OrderStatus::allowed_transitions`] and logged as [`OrderEvent`] rows.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "order_status", rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    InProcess,
    Shipped,
    Delivered,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::InProcess => "in_process",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn allowed_transitions(self) -> &'static [OrderStatus] {
        use OrderStatus::*;
        match self {
            Pending => &[Confirmed, Cancelled],
            Confirmed => &[InProcess, Cancelled],
            InProcess => &[Shipped, Cancelled],
            Shipped => &[Delivered, Cancelled],
            Delivered => &[Completed],
            Completed | Cancelled => &[],
        }
    }

    pub fn can_transition_to(self, to: OrderStatus) -> bool {
        self.allowed_transitions().contains(&to)
    }

    pub fn is_terminal(self) -> bool {
        self.allowed_transitions().is_empty()
    }
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confirming a pending order is the point where stock is actually taken.
pub fn transition_debits_stock(from: OrderStatus, to: OrderStatus) -> bool {
    from == OrderStatus::Pending && to == OrderStatus::Confirmed
}

/// Cancelling after confirmation returns what the confirmation debited.
/// A pending order never debited anything, and a shipped order's stock has
/// physically left the store, so neither is credited back.
pub fn transition_credits_stock(from: OrderStatus, to: OrderStatus) -> bool {
    matches!(from, OrderStatus::Confirmed | OrderStatus::InProcess) && to == OrderStatus::Cancelled
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "payment_method", rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Transfer,
    Yape,
    Plin,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "sales_channel", rename_all = "snake_case")]
pub enum SalesChannel {
    InStore,
    Web,
    Phone,
    Social,
    Other,
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct Order {
    pub id: Uuid,
    pub order_seq: i64,
    pub customer_id: Uuid,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub channel: SalesChannel,
    pub shipping_address: Option<String>,
    pub contact_phone: Option<String>,
    pub notes: Option<String>,
    pub payment_proof_url: Option<String>,
    pub operation_code: Option<String>,
    pub subtotal: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Human-readable number derived from the insertion sequence, e.g. `ORD-000042`.
    pub fn order_number(&self) -> String {
        format!("ORD-{:06}", self.order_seq)
    }
}

#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderLine {
    pub id: Uuid,
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// Order line joined with the catalog name for API responses.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderLineView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub subtotal: Decimal,
}

/// One entry of an order's status history.
#[derive(Clone, Debug, Serialize, sqlx::FromRow)]
pub struct OrderEvent {
    pub id: Uuid,
    pub order_id: Uuid,
    pub from_status: Option<OrderStatus>,
    pub to_status: OrderStatus,
    pub actor: String,
    pub note: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use OrderStatus::*;

    const ALL: [OrderStatus; 7] =
        [Pending, Confirmed, InProcess, Shipped, Delivered, Completed, Cancelled];

    #[test]
    fn transition_table_matches_lifecycle() {
        assert!(Pending.can_transition_to(Confirmed));
        assert!(Pending.can_transition_to(Cancelled));
        assert!(Confirmed.can_transition_to(InProcess));
        assert!(Confirmed.can_transition_to(Cancelled));
        assert!(InProcess.can_transition_to(Shipped));
        assert!(InProcess.can_transition_to(Cancelled));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(Shipped.can_transition_to(Cancelled));
        assert!(Delivered.can_transition_to(Completed));
    }

    #[test]
    fn terminal_states_have_no_exits() {
        for to in ALL {
            assert!(!Completed.can_transition_to(to), "completed -> {to}");
            assert!(!Cancelled.can_transition_to(to), "cancelled -> {to}");
        }
        assert!(Completed.is_terminal());
        assert!(Cancelled.is_terminal());
        assert!(!Pending.is_terminal());
    }

    #[test]
    fn skipping_states_is_rejected() {
        assert!(!Pending.can_transition_to(Shipped));
        assert!(!Pending.can_transition_to(Completed));
        assert!(!Confirmed.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Cancelled));
        // No self-loops either.
        for s in ALL {
            assert!(!s.can_transition_to(s), "{s} -> {s}");
        }
    }

    #[test]
    fn stock_moves_only_on_confirm_and_early_cancel() {
        assert!(transition_debits_stock(Pending, Confirmed));
        assert!(transition_credits_stock(Confirmed, Cancelled));
        assert!(transition_credits_stock(InProcess, Cancelled));

        // Pending never debited, shipped goods are gone.
        assert!(!transition_credits_stock(Pending, Cancelled));
        assert!(!transition_credits_stock(Shipped, Cancelled));

        for from in ALL {
            for to in ALL {
                if from == Pending && to == Confirmed {
                    continue;
                }
                assert!(!transition_debits_stock(from, to), "{from} -> {to}");
            }
        }
    }

    #[test]
    fn order_number_is_zero_padded_sequence() {
        let now = Utc::now();
        let order = Order {
            id: Uuid::now_v7(),
            order_seq: 42,
            customer_id: Uuid::now_v7(),
            status: Pending,
            payment_method: PaymentMethod::Cash,
            channel: SalesChannel::Web,
            shipping_address: None,
            contact_phone: None,
            notes: None,
            payment_proof_url: None,
            operation_code: None,
            subtotal: Decimal::ZERO,
            discount: Decimal::ZERO,
            total: Decimal::ZERO,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(order.order_number(), "ORD-000042");
    }
}
