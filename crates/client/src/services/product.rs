//! Product catalog service.

use emporium_core::{Product, ProductId};
use serde::Serialize;
use tracing::instrument;

use super::call;
use crate::api::{ApiRequest, Transport};
use crate::error::ApiError;

#[derive(Serialize)]
struct SearchBody<'a> {
    query: &'a str,
}

#[derive(Serialize)]
struct InventoryBody {
    quantity: i32,
}

/// Full catalog. `GET /products`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a list of products.
#[instrument(skip(api))]
pub async fn get_products<T: Transport>(api: &T) -> Result<Vec<Product>, ApiError> {
    call(api, ApiRequest::get("/products")).await
}

/// One product. `GET /products/{id}`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a product.
#[instrument(skip(api))]
pub async fn get_product<T: Transport>(api: &T, id: ProductId) -> Result<Product, ApiError> {
    call(api, ApiRequest::get(format!("/products/{id}"))).await
}

/// Free-text search. `POST /products/search`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a list of products.
#[instrument(skip(api))]
pub async fn search_products<T: Transport>(api: &T, query: &str) -> Result<Vec<Product>, ApiError> {
    call(api, ApiRequest::post("/products/search", &SearchBody { query })?).await
}

/// Set units on hand. `PUT /products/{productId}/inventory`
///
/// # Errors
///
/// Returns an error if the request fails or the response is not a product.
#[instrument(skip(api))]
pub async fn update_inventory<T: Transport>(
    api: &T,
    product_id: ProductId,
    quantity: i32,
) -> Result<Product, ApiError> {
    call(
        api,
        ApiRequest::put(
            format!("/products/{product_id}/inventory"),
            &InventoryBody { quantity },
        )?,
    )
    .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use reqwest::Method;
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    #[tokio::test]
    async fn test_search_products_body() {
        let api = FakeTransport::new();
        api.respond(json!([{"id": 1, "name": "Mug", "price": 10}]));

        let results = search_products(&api, "mug").await.unwrap();

        assert_eq!(results.len(), 1);
        let sent = api.requests();
        assert_eq!(sent[0].method, Method::POST);
        assert_eq!(sent[0].path, "/products/search");
        assert_eq!(sent[0].body, Some(json!({"query": "mug"})));
    }

    #[tokio::test]
    async fn test_update_inventory_body() {
        let api = FakeTransport::new();
        api.respond(json!({"id": 4, "name": "Cap", "price": 5, "stock": 12}));

        let product = update_inventory(&api, ProductId::new(4), 12).await.unwrap();

        assert_eq!(product.stock, Some(12));
        let sent = api.requests();
        assert_eq!(sent[0].method, Method::PUT);
        assert_eq!(sent[0].path, "/products/4/inventory");
        assert_eq!(sent[0].body, Some(json!({"quantity": 12})));
    }

    #[tokio::test]
    async fn test_unexpected_payload_is_parse_error() {
        let api = FakeTransport::new();
        api.respond(json!({"not": "a list"}));

        let err = get_products(&api).await.unwrap_err();
        assert!(matches!(err, ApiError::Parse(_)));
    }
}
