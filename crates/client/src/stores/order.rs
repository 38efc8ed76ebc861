//! Orders, payments, and the shopping cart.

use std::sync::Arc;

use emporium_core::{
    Cart, Order, OrderId, OrderRequest, OrderStatus, Payment, PaymentId, PaymentRequest, Product,
    ProductId, UserId,
};
use rust_decimal::Decimal;
use tokio::sync::watch;
use tracing::{debug, instrument};

use super::{ActionStatus, StatusTracker};
use crate::api::Transport;
use crate::error::ApiError;
use crate::services;

/// Order history, the order being viewed, and the local cart.
pub struct OrderStore<T> {
    api: Arc<T>,
    orders: Vec<Order>,
    current_order: Option<Order>,
    cart: Cart,
    status: StatusTracker,
}

impl<T: Transport> OrderStore<T> {
    #[must_use]
    pub fn new(api: Arc<T>) -> Self {
        Self {
            api,
            orders: Vec::new(),
            current_order: None,
            cart: Cart::new(),
            status: StatusTracker::new("order"),
        }
    }

    // -------------------------------------------------------------------------
    // Actions
    // -------------------------------------------------------------------------

    /// Place an order. On success it becomes the current order, is appended
    /// to the history, and the cart is emptied.
    ///
    /// # Errors
    ///
    /// Returns the service error; the store's error is set to the server
    /// message or "Failed to create order".
    #[instrument(skip(self, request), fields(user_id = %request.user_id))]
    pub async fn create_order(&mut self, request: &OrderRequest) -> Result<Order, ApiError> {
        let _loading = self.status.begin();
        match services::order::create_order(&*self.api, request).await {
            Ok(order) => {
                self.orders.push(order.clone());
                self.current_order = Some(order.clone());
                self.cart.clear();
                self.status.succeed("create_order");
                Ok(order)
            }
            Err(e) => Err(self.status.fail("create_order", "Failed to create order", e)),
        }
    }

    /// Check out the current cart for `user_id`.
    ///
    /// # Errors
    ///
    /// Same as [`create_order`](Self::create_order).
    pub async fn checkout(
        &mut self,
        user_id: UserId,
        shipping_address: &str,
        payment_method: Option<&str>,
    ) -> Result<Order, ApiError> {
        let mut request = OrderRequest::from_cart(user_id, shipping_address, &self.cart);
        if let Some(method) = payment_method {
            request = request.with_payment_method(method);
        }
        self.create_order(&request).await
    }

    /// Replace the order history with the user's orders.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Failed to fetch orders".
    #[instrument(skip(self))]
    pub async fn fetch_user_orders(&mut self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        let _loading = self.status.begin();
        match services::order::get_user_orders(&*self.api, user_id).await {
            Ok(orders) => {
                self.orders.clone_from(&orders);
                self.status.succeed("fetch_user_orders");
                Ok(orders)
            }
            Err(e) => Err(self.status.fail("fetch_user_orders", "Failed to fetch orders", e)),
        }
    }

    /// Load one order as the current order.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Failed to fetch order".
    #[instrument(skip(self))]
    pub async fn fetch_order(&mut self, order_id: OrderId) -> Result<Order, ApiError> {
        let _loading = self.status.begin();
        match services::order::get_order(&*self.api, order_id).await {
            Ok(order) => {
                self.current_order = Some(order.clone());
                self.status.succeed("fetch_order");
                Ok(order)
            }
            Err(e) => Err(self.status.fail("fetch_order", "Failed to fetch order", e)),
        }
    }

    /// Charge an order. Store state other than the status is untouched.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Payment failed".
    #[instrument(skip(self, request), fields(order_id = %request.order_id))]
    pub async fn process_payment(&mut self, request: &PaymentRequest) -> Result<Payment, ApiError> {
        let _loading = self.status.begin();
        match services::payment::process_payment(&*self.api, request).await {
            Ok(payment) => {
                debug!(payment_id = %payment.id, status = ?payment.status, "Payment processed");
                self.status.succeed("process_payment");
                Ok(payment)
            }
            Err(e) => Err(self.status.fail("process_payment", "Payment failed", e)),
        }
    }

    /// Move an order to `status`, refreshing any loaded copy of it.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Failed to update order status".
    #[instrument(skip(self))]
    pub async fn update_order_status(
        &mut self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let _loading = self.status.begin();
        match services::order::update_order_status(&*self.api, order_id, status).await {
            Ok(order) => {
                if let Some(existing) = self.orders.iter_mut().find(|o| o.id == order.id) {
                    *existing = order.clone();
                }
                if self.current_order.as_ref().is_some_and(|o| o.id == order.id) {
                    self.current_order = Some(order.clone());
                }
                self.status.succeed("update_order_status");
                Ok(order)
            }
            Err(e) => Err(self
                .status
                .fail("update_order_status", "Failed to update order status", e)),
        }
    }

    /// Refund a payment.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Refund failed".
    #[instrument(skip(self))]
    pub async fn refund_payment(&mut self, payment_id: PaymentId) -> Result<Payment, ApiError> {
        let _loading = self.status.begin();
        match services::payment::refund_payment(&*self.api, payment_id).await {
            Ok(payment) => {
                self.status.succeed("refund_payment");
                Ok(payment)
            }
            Err(e) => Err(self.status.fail("refund_payment", "Refund failed", e)),
        }
    }

    /// Payment recorded against an order.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Failed to fetch payment".
    #[instrument(skip(self))]
    pub async fn fetch_payment(&mut self, order_id: OrderId) -> Result<Payment, ApiError> {
        let _loading = self.status.begin();
        match services::payment::get_payment_by_order_id(&*self.api, order_id).await {
            Ok(payment) => {
                self.status.succeed("fetch_payment");
                Ok(payment)
            }
            Err(e) => Err(self.status.fail("fetch_payment", "Failed to fetch payment", e)),
        }
    }

    // -------------------------------------------------------------------------
    // Cart
    // -------------------------------------------------------------------------

    /// Add one unit of `product`.
    pub fn add_to_cart(&mut self, product: &Product) {
        self.cart.add(product);
    }

    pub fn remove_from_cart(&mut self, product_id: ProductId) {
        self.cart.remove(product_id);
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn update_cart_item_quantity(&mut self, product_id: ProductId, quantity: i64) {
        self.cart.update_quantity(product_id, quantity);
    }

    pub fn clear_cart(&mut self) {
        self.cart.clear();
    }

    // -------------------------------------------------------------------------
    // Getters
    // -------------------------------------------------------------------------

    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub const fn current_order(&self) -> Option<&Order> {
        self.current_order.as_ref()
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn cart_total(&self) -> Decimal {
        self.cart.total()
    }

    #[must_use]
    pub fn cart_item_count(&self) -> u64 {
        self.cart.item_count()
    }

    #[must_use]
    pub fn status(&self) -> ActionStatus {
        self.status.snapshot()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ActionStatus> {
        self.status.subscribe()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::testing::FakeTransport;

    fn store() -> (Arc<FakeTransport>, OrderStore<FakeTransport>) {
        let api = Arc::new(FakeTransport::new());
        (Arc::clone(&api), OrderStore::new(api))
    }

    fn product(id: i64, price: i64) -> Product {
        Product::new(ProductId::new(id), format!("Product {id}"), Decimal::from(price))
    }

    #[test]
    fn test_cart_totals() {
        let (_, mut store) = store();
        store.add_to_cart(&product(1, 10));
        store.add_to_cart(&product(1, 10));
        store.add_to_cart(&product(2, 5));

        assert_eq!(store.cart().len(), 2);
        assert_eq!(store.cart_total(), Decimal::from(25));
        assert_eq!(store.cart_item_count(), 3);
    }

    #[test]
    fn test_update_quantity_to_zero_removes_line() {
        let (_, mut store) = store();
        store.add_to_cart(&product(1, 10));
        store.add_to_cart(&product(2, 5));

        store.update_cart_item_quantity(ProductId::new(1), 0);
        assert!(store.cart().get(ProductId::new(1)).is_none());

        store.update_cart_item_quantity(ProductId::new(2), 4);
        assert_eq!(store.cart_item_count(), 4);

        store.update_cart_item_quantity(ProductId::new(9), 3);
        assert_eq!(store.cart().len(), 1);

        store.remove_from_cart(ProductId::new(2));
        assert!(store.cart().is_empty());
    }

    #[tokio::test]
    async fn test_checkout_clears_cart_and_records_order() {
        let (api, mut store) = store();
        store.add_to_cart(&product(1, 10));
        store.add_to_cart(&product(1, 10));
        api.respond(json!({
            "id": 77,
            "userId": 5,
            "status": "PENDING",
            "totalAmount": "20.00",
            "items": [{"productId": 1, "productName": "Product 1", "price": "10.00", "quantity": 2}]
        }));

        let order = store
            .checkout(UserId::new(5), "1 Main St", Some("CARD"))
            .await
            .unwrap();

        assert_eq!(order.id, OrderId::new(77));
        assert!(store.cart().is_empty());
        assert_eq!(store.orders().len(), 1);
        assert_eq!(store.current_order().map(|o| o.id), Some(OrderId::new(77)));
        assert_eq!(store.status(), ActionStatus::default());

        let body = api.requests()[0].body.clone().unwrap();
        assert_eq!(body["items"], json!([{"productId": 1, "quantity": 2}]));
        assert_eq!(body["paymentMethod"], "CARD");
    }

    #[tokio::test]
    async fn test_create_order_failure_keeps_cart() {
        let (api, mut store) = store();
        store.add_to_cart(&product(1, 10));
        api.fail(400, r#"{"message":"Insufficient stock"}"#);

        let err = store
            .checkout(UserId::new(5), "1 Main St", None)
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(400));
        assert_eq!(store.cart().len(), 1);
        assert!(store.orders().is_empty());
        let status = store.status();
        assert!(!status.loading);
        assert_eq!(status.error.as_deref(), Some("Insufficient stock"));
    }

    #[tokio::test]
    async fn test_fetch_orders_fallback_message() {
        let (api, mut store) = store();
        api.fail(502, "Bad Gateway");

        store.fetch_user_orders(UserId::new(5)).await.unwrap_err();

        assert_eq!(store.status().error.as_deref(), Some("Failed to fetch orders"));
    }

    #[tokio::test]
    async fn test_next_action_clears_previous_error() {
        let (api, mut store) = store();
        api.fail(500, "");
        api.respond(json!([{"id": 1}, {"id": 2}]));

        store.fetch_user_orders(UserId::new(5)).await.unwrap_err();
        let orders = store.fetch_user_orders(UserId::new(5)).await.unwrap();

        assert_eq!(orders.len(), 2);
        assert_eq!(store.orders().len(), 2);
        assert!(store.status().error.is_none());
    }

    #[tokio::test]
    async fn test_update_order_status_refreshes_loaded_copies() {
        let (api, mut store) = store();
        api.respond(json!([{"id": 1, "status": "PENDING"}, {"id": 2, "status": "PENDING"}]));
        api.respond(json!({"id": 2, "status": "PENDING"}));
        api.respond(json!({"id": 2, "status": "CANCELLED"}));

        store.fetch_user_orders(UserId::new(5)).await.unwrap();
        store.fetch_order(OrderId::new(2)).await.unwrap();
        store
            .update_order_status(OrderId::new(2), OrderStatus::Cancelled)
            .await
            .unwrap();

        assert_eq!(store.orders()[0].status, OrderStatus::Pending);
        assert_eq!(store.orders()[1].status, OrderStatus::Cancelled);
        assert_eq!(
            store.current_order().map(|o| o.status),
            Some(OrderStatus::Cancelled)
        );
    }

    #[tokio::test]
    async fn test_payment_failure_message() {
        let (api, mut store) = store();
        api.fail(402, "");

        let request = PaymentRequest::new(OrderId::new(1), UserId::new(5), Decimal::from(20), "CARD");
        store.process_payment(&request).await.unwrap_err();

        assert_eq!(store.status().error.as_deref(), Some("Payment failed"));
    }

    #[tokio::test]
    async fn test_refund_and_fetch_payment() {
        let (api, mut store) = store();
        let payment = json!({
            "id": 9, "orderId": 1, "userId": 5, "amount": "20.00",
            "paymentMethod": "CARD", "status": "REFUNDED"
        });
        api.respond(payment.clone());
        api.respond(payment);

        let refunded = store.refund_payment(PaymentId::new(9)).await.unwrap();
        let fetched = store.fetch_payment(OrderId::new(1)).await.unwrap();

        assert_eq!(refunded, fetched);
        assert_eq!(api.requests()[1].path, "/payments/1");
    }
}
