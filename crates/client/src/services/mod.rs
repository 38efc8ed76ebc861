//! Service layer: one function per backend operation.
//!
//! Services are stateless. Each maps a logical operation to exactly one
//! HTTP call through the shared [`Transport`] and returns the decoded
//! payload unchanged; state handling lives in the stores.
//!
//! | Service | Endpoints |
//! |---|---|
//! | [`order`] | `/orders`, `/orders/{id}`, `/orders/{id}/status` |
//! | [`payment`] | `/payments/process`, `/payments/refund`, `/payments/{orderId}` |
//! | [`product`] | `/products`, `/products/{id}`, `/products/search`, `/products/{id}/inventory` |
//! | [`user`] | `/users/register`, `/users/login`, `/users/profile` |

pub mod order;
pub mod payment;
pub mod product;
pub mod user;

use serde::de::DeserializeOwned;

use crate::api::{ApiRequest, Transport};
use crate::error::ApiError;

/// Send `request` and decode the response body as `R`.
async fn call<T, R>(transport: &T, request: ApiRequest) -> Result<R, ApiError>
where
    T: Transport,
    R: DeserializeOwned,
{
    let value = transport.send(request).await?;
    Ok(serde_json::from_value(value)?)
}
