//! Payments against orders.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Extra;
use crate::types::{OrderId, PaymentId, PaymentStatus, UserId};

/// A payment record from the payment service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
    pub id: PaymentId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub payment_method: String,
    #[serde(default)]
    pub status: PaymentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<NaiveDateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<NaiveDateTime>,
    #[serde(flatten)]
    pub extra: Extra,
}

/// Body of `POST /payments/process`.
///
/// Implements `Debug` manually to redact card fields.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub amount: Decimal,
    pub payment_method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cvv: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_holder_name: Option<String>,
}

impl PaymentRequest {
    /// Create a payment request without card details.
    #[must_use]
    pub fn new(
        order_id: OrderId,
        user_id: UserId,
        amount: Decimal,
        payment_method: impl Into<String>,
    ) -> Self {
        Self {
            order_id,
            user_id,
            amount,
            payment_method: payment_method.into(),
            card_number: None,
            expiry_date: None,
            cvv: None,
            card_holder_name: None,
        }
    }

    /// Attach card details.
    #[must_use]
    pub fn with_card(
        mut self,
        number: impl Into<String>,
        expiry: impl Into<String>,
        cvv: impl Into<String>,
        holder: impl Into<String>,
    ) -> Self {
        self.card_number = Some(number.into());
        self.expiry_date = Some(expiry.into());
        self.cvv = Some(cvv.into());
        self.card_holder_name = Some(holder.into());
        self
    }
}

impl std::fmt::Debug for PaymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let redacted = |field: &Option<String>| field.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("PaymentRequest")
            .field("order_id", &self.order_id)
            .field("user_id", &self.user_id)
            .field("amount", &self.amount)
            .field("payment_method", &self.payment_method)
            .field("card_number", &redacted(&self.card_number))
            .field("expiry_date", &redacted(&self.expiry_date))
            .field("cvv", &redacted(&self.cvv))
            .field("card_holder_name", &self.card_holder_name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_request_debug_redacts_card() {
        let request = PaymentRequest::new(OrderId::new(1), UserId::new(2), Decimal::TEN, "CARD")
            .with_card("4111111111111111", "12/30", "123", "Ana Diaz");

        let debug_output = format!("{request:?}");

        assert!(debug_output.contains("Ana Diaz"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("4111111111111111"));
        assert!(!debug_output.contains("12/30"));
        assert!(!debug_output.contains("\"123\""));
    }

    #[test]
    fn test_payment_request_omits_missing_card_fields() {
        let request = PaymentRequest::new(OrderId::new(1), UserId::new(2), Decimal::TEN, "PAYPAL");
        let value = serde_json::to_value(&request).unwrap_or_default();
        assert!(value.get("cardNumber").is_none());
        assert_eq!(value["paymentMethod"], "PAYPAL");
    }
}
