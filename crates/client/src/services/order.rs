//! Order service.

use emporium_core::{Order, OrderId, OrderRequest, OrderStatus, UserId};
use serde::Serialize;
use tracing::instrument;

use super::call;
use crate::api::{ApiRequest, Transport};
use crate::error::ApiError;

#[derive(Serialize)]
struct StatusBody {
    status: OrderStatus,
}

/// Place an order. `POST /orders`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not an order.
#[instrument(skip(api, order), fields(user_id = %order.user_id, lines = order.items.len()))]
pub async fn create_order<T: Transport>(api: &T, order: &OrderRequest) -> Result<Order, ApiError> {
    call(api, ApiRequest::post("/orders", order)?).await
}

/// List a user's orders. `GET /orders/{userId}`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a list of orders.
#[instrument(skip(api))]
pub async fn get_user_orders<T: Transport>(api: &T, user_id: UserId) -> Result<Vec<Order>, ApiError> {
    call(api, ApiRequest::get(format!("/orders/{user_id}"))).await
}

/// Fetch one order. `GET /orders/{orderId}`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not an order.
#[instrument(skip(api))]
pub async fn get_order<T: Transport>(api: &T, order_id: OrderId) -> Result<Order, ApiError> {
    call(api, ApiRequest::get(format!("/orders/{order_id}"))).await
}

/// Move an order to a new status. `PUT /orders/{orderId}/status`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not an order.
#[instrument(skip(api))]
pub async fn update_order_status<T: Transport>(
    api: &T,
    order_id: OrderId,
    status: OrderStatus,
) -> Result<Order, ApiError> {
    call(
        api,
        ApiRequest::put(format!("/orders/{order_id}/status"), &StatusBody { status })?,
    )
    .await
}
