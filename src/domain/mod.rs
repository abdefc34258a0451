//! Domain types shared across services and handlers.

pub mod cart;
pub mod order;
pub mod product;
pub mod proof;

pub use cart::{Cart, CartLine, CartLineView, CartStatus, CartView};
pub use order::{
    Order, OrderEvent, OrderLine, OrderLineView, OrderStatus, PaymentMethod, SalesChannel,
};
pub use product::Product;
