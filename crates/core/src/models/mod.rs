//! Payloads exchanged with the shop backend.
//!
//! Known fields are typed; anything else the backend sends is kept in the
//! `extra` map of each entity so a payload can be stored and re-serialized
//! without losing data.

pub mod order;
pub mod payment;
pub mod product;
pub mod user;

pub use order::{Order, OrderItem, OrderItemRequest, OrderRequest};
pub use payment::{Payment, PaymentRequest};
pub use product::Product;
pub use user::{ProfileUpdate, User};

/// Unrecognized payload fields, preserved verbatim.
pub type Extra = serde_json::Map<String, serde_json::Value>;
