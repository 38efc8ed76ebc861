//! Cart, checkout, payment, and order history against the stub backend.

use std::sync::Arc;

use emporium_client::{
    ApiClient, MemoryTokenStore, OrderStore, ProductStore, Registration, UserStore,
};
use emporium_core::{Email, OrderStatus, PaymentRequest, PaymentStatus, ProductId, User};
use emporium_integration_tests::{DECLINED_CARD, StubBackend};
use rust_decimal::Decimal;
use secrecy::SecretString;

/// Register a shopper and return the shared transport carrying their token.
async fn signed_in(backend: &StubBackend) -> (Arc<ApiClient>, User) {
    let api = backend.client();
    let mut users = UserStore::new(Arc::clone(&api), MemoryTokenStore::new());
    let user = users
        .register(&Registration {
            email: Email::parse("shopper@example.com").expect("valid email"),
            password: SecretString::from("pw-123456"),
            first_name: "Sam".to_string(),
            last_name: "Shopper".to_string(),
            phone: None,
            address: None,
        })
        .await
        .expect("registration succeeds");
    (api, user)
}

/// Fill an order store's cart with `quantity` units of each product.
async fn fill_cart(api: &Arc<ApiClient>, orders: &mut OrderStore<ApiClient>, lines: &[(i64, i64)]) {
    let mut products = ProductStore::new(Arc::clone(api));
    for &(id, quantity) in lines {
        let product = products
            .fetch_product(ProductId::new(id))
            .await
            .expect("product exists");
        orders.add_to_cart(&product);
        orders.update_cart_item_quantity(product.id, quantity);
    }
}

#[tokio::test]
async fn test_checkout_places_order_and_empties_cart() {
    let backend = StubBackend::start().await;
    let (api, user) = signed_in(&backend).await;
    let mut orders = OrderStore::new(Arc::clone(&api));

    fill_cart(&api, &mut orders, &[(1, 2), (2, 1)]).await;
    assert_eq!(orders.cart_total(), Decimal::new(4300, 2));
    assert_eq!(orders.cart_item_count(), 3);

    let order = orders
        .checkout(user.id, "1 Main St", Some("CREDIT_CARD"))
        .await
        .expect("checkout succeeds");

    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.total(), Decimal::new(4300, 2));
    assert_eq!(order.items.len(), 2);
    assert!(orders.cart().is_empty());
    assert_eq!(orders.orders().len(), 1);
    assert_eq!(orders.current_order().map(|o| o.id), Some(order.id));
    assert_eq!(backend.stock(1), Some(8));
    assert_eq!(backend.stock(2), Some(2));
}

#[tokio::test]
async fn test_insufficient_stock_keeps_cart() {
    let backend = StubBackend::start().await;
    let (api, user) = signed_in(&backend).await;
    let mut orders = OrderStore::new(Arc::clone(&api));

    fill_cart(&api, &mut orders, &[(2, 5)]).await;
    let err = orders
        .checkout(user.id, "1 Main St", None)
        .await
        .expect_err("only 3 totes in stock");

    assert_eq!(err.status(), Some(400));
    assert_eq!(
        orders.status().error.as_deref(),
        Some("Insufficient stock for product: Canvas Tote")
    );
    assert_eq!(orders.cart_item_count(), 5);
    assert!(orders.orders().is_empty());
    assert_eq!(backend.stock(2), Some(3));
}

#[tokio::test]
async fn test_checkout_requires_session() {
    let backend = StubBackend::start().await;
    let api = backend.client();
    let mut orders = OrderStore::new(Arc::clone(&api));
    fill_cart(&api, &mut orders, &[(1, 1)]).await;

    let err = orders
        .checkout(emporium_core::UserId::new(1), "1 Main St", None)
        .await
        .expect_err("anonymous checkout is rejected");

    assert!(err.is_unauthorized());
    assert_eq!(orders.status().error.as_deref(), Some("Failed to create order"));
    assert_eq!(orders.cart().len(), 1);
}

#[tokio::test]
async fn test_pay_then_refund() {
    let backend = StubBackend::start().await;
    let (api, user) = signed_in(&backend).await;
    let mut orders = OrderStore::new(Arc::clone(&api));
    fill_cart(&api, &mut orders, &[(1, 1)]).await;
    let order = orders
        .checkout(user.id, "1 Main St", Some("CREDIT_CARD"))
        .await
        .expect("checkout succeeds");

    let request = PaymentRequest::new(order.id, user.id, order.total(), "CREDIT_CARD")
        .with_card("4242424242424242", "12/30", "123", "Sam Shopper");
    let payment = orders
        .process_payment(&request)
        .await
        .expect("payment succeeds");
    assert_eq!(payment.status, PaymentStatus::Completed);
    assert_eq!(payment.amount, Decimal::new(1250, 2));

    let fetched = orders.fetch_payment(order.id).await.expect("payment recorded");
    assert_eq!(fetched.id, payment.id);

    let confirmed = orders.fetch_order(order.id).await.expect("order exists");
    assert_eq!(confirmed.status, OrderStatus::Confirmed);

    let refunded = orders.refund_payment(payment.id).await.expect("refund succeeds");
    assert_eq!(refunded.status, PaymentStatus::Refunded);

    orders
        .refund_payment(payment.id)
        .await
        .expect_err("already refunded");
    assert_eq!(
        orders.status().error.as_deref(),
        Some("Only completed payments can be refunded")
    );
}

#[tokio::test]
async fn test_declined_payment() {
    let backend = StubBackend::start().await;
    let (api, user) = signed_in(&backend).await;
    let mut orders = OrderStore::new(Arc::clone(&api));
    fill_cart(&api, &mut orders, &[(1, 1)]).await;
    let order = orders
        .checkout(user.id, "1 Main St", None)
        .await
        .expect("checkout succeeds");

    let request = PaymentRequest::new(order.id, user.id, order.total(), DECLINED_CARD);
    let err = orders
        .process_payment(&request)
        .await
        .expect_err("card is declined");

    assert_eq!(err.status(), Some(402));
    assert_eq!(
        orders.status().error.as_deref(),
        Some("Payment declined by issuer")
    );
}

#[tokio::test]
async fn test_order_history_and_status_updates() {
    let backend = StubBackend::start().await;
    let (api, user) = signed_in(&backend).await;
    let mut orders = OrderStore::new(Arc::clone(&api));

    for _ in 0..2 {
        fill_cart(&api, &mut orders, &[(1, 1)]).await;
        orders
            .checkout(user.id, "1 Main St", None)
            .await
            .expect("checkout succeeds");
    }

    // A fresh store, as on the next launch.
    let mut history = OrderStore::new(Arc::clone(&api));
    let listed = history
        .fetch_user_orders(user.id)
        .await
        .expect("history loads");
    assert_eq!(listed.len(), 2);

    let first = listed.first().map(|o| o.id).expect("two orders");
    history.fetch_order(first).await.expect("order loads");
    let shipped = history
        .update_order_status(first, OrderStatus::Shipped)
        .await
        .expect("status update succeeds");

    assert_eq!(shipped.status, OrderStatus::Shipped);
    assert_eq!(
        history.current_order().map(|o| o.status),
        Some(OrderStatus::Shipped)
    );
    assert_eq!(
        history.orders().iter().find(|o| o.id == first).map(|o| o.status),
        Some(OrderStatus::Shipped)
    );
}

#[tokio::test]
async fn test_missing_order_message() {
    let backend = StubBackend::start().await;
    let (api, _user) = signed_in(&backend).await;
    let mut orders = OrderStore::new(api);

    orders
        .fetch_order(emporium_core::OrderId::new(4242))
        .await
        .expect_err("no such order");

    assert_eq!(
        orders.status().error.as_deref(),
        Some("Order not found with id: 4242")
    );
    assert!(orders.current_order().is_none());
}
