//! Orders and order requests.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Extra;
use crate::cart::Cart;
use crate::types::{OrderId, OrderItemId, OrderStatus, ProductId, UserId};

/// An order as stored by the order service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub status: OrderStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub extra: Extra,
}

impl Order {
    /// Total charged for the order.
    ///
    /// Uses the backend's `totalAmount` when present, otherwise sums the
    /// line items.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.total_amount
            .unwrap_or_else(|| self.items.iter().map(OrderItem::line_total).sum())
    }
}

/// A line of a placed order. Prices are frozen at order time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<OrderItemId>,
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtotal: Option<Decimal>,
}

impl OrderItem {
    /// Line total, preferring the backend's subtotal.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.subtotal
            .unwrap_or_else(|| self.price * Decimal::from(self.quantity))
    }
}

/// Body of `POST /orders`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRequest {
    pub user_id: UserId,
    pub shipping_address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<String>,
    pub items: Vec<OrderItemRequest>,
}

impl OrderRequest {
    /// Build an order request for everything currently in the cart.
    #[must_use]
    pub fn from_cart(user_id: UserId, shipping_address: impl Into<String>, cart: &Cart) -> Self {
        Self {
            user_id,
            shipping_address: shipping_address.into(),
            billing_address: None,
            payment_method: None,
            items: cart.order_items(),
        }
    }

    /// Set the billing address.
    #[must_use]
    pub fn with_billing_address(mut self, address: impl Into<String>) -> Self {
        self.billing_address = Some(address.into());
        self
    }

    /// Set the payment method.
    #[must_use]
    pub fn with_payment_method(mut self, method: impl Into<String>) -> Self {
        self.payment_method = Some(method.into());
        self
    }
}

/// One requested line of an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemRequest {
    pub product_id: ProductId,
    pub quantity: u32,
}
