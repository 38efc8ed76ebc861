//! Payment service.

use emporium_core::{OrderId, Payment, PaymentId, PaymentRequest};
use serde::Serialize;
use tracing::instrument;

use super::call;
use crate::api::{ApiRequest, Transport};
use crate::error::ApiError;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefundBody {
    payment_id: PaymentId,
}

/// Charge an order. `POST /payments/process`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a payment.
#[instrument(skip(api, payment), fields(order_id = %payment.order_id, amount = %payment.amount))]
pub async fn process_payment<T: Transport>(
    api: &T,
    payment: &PaymentRequest,
) -> Result<Payment, ApiError> {
    call(api, ApiRequest::post("/payments/process", payment)?).await
}

/// Refund a payment. `POST /payments/refund`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a payment.
#[instrument(skip(api))]
pub async fn refund_payment<T: Transport>(
    api: &T,
    payment_id: PaymentId,
) -> Result<Payment, ApiError> {
    call(api, ApiRequest::post("/payments/refund", &RefundBody { payment_id })?).await
}

/// Payment recorded for an order. `GET /payments/{orderId}`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a payment.
#[instrument(skip(api))]
pub async fn get_payment_by_order_id<T: Transport>(
    api: &T,
    order_id: OrderId,
) -> Result<Payment, ApiError> {
    call(api, ApiRequest::get(format!("/payments/{order_id}"))).await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use emporium_core::{PaymentStatus, UserId};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    fn payment_json(status: &str) -> serde_json::Value {
        json!({
            "id": 11,
            "orderId": 30,
            "userId": 5,
            "amount": "25.00",
            "paymentMethod": "CARD",
            "status": status
        })
    }

    #[tokio::test]
    async fn test_process_payment() {
        let api = FakeTransport::new();
        api.respond(payment_json("COMPLETED"));

        let request = PaymentRequest::new(OrderId::new(30), UserId::new(5), Decimal::from(25), "CARD");
        let payment = process_payment(&api, &request).await.unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(api.requests()[0].path, "/payments/process");
    }

    #[tokio::test]
    async fn test_refund_payment_body() {
        let api = FakeTransport::new();
        api.respond(payment_json("REFUNDED"));

        refund_payment(&api, PaymentId::new(11)).await.unwrap();

        let sent = api.requests();
        assert_eq!(sent[0].path, "/payments/refund");
        assert_eq!(sent[0].body, Some(json!({"paymentId": 11})));
    }

    #[tokio::test]
    async fn test_get_payment_by_order_id_path() {
        let api = FakeTransport::new();
        api.respond(payment_json("PENDING"));

        get_payment_by_order_id(&api, OrderId::new(30)).await.unwrap();

        assert_eq!(api.requests()[0].path, "/payments/30");
    }
}
