//! End-to-end test support for the Emporium client.
//!
//! [`StubBackend`] serves the shop REST API from an in-process `axum`
//! router bound to an ephemeral port, so tests drive the real `reqwest`
//! transport, the services, and the stores without any external service.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p emporium-integration-tests
//! ```
//!
//! # Stub behavior
//!
//! - Catalog is seeded with three products (see [`StubBackend::start`])
//! - Register/login issue an opaque token `token-{user_id}-{n}`
//! - Orders decrement stock and reject lines exceeding it
//! - Payment method `DECLINED_CARD` is rejected by the payment endpoint
//! - `GET /orders/{id}` serves both the user-orders and single-order
//!   lookups; order ids start at 1000 so they never collide with user ids

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use axum::extract::{Path as UrlPath, Request, State};
use axum::http::{HeaderMap, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use emporium_client::{ApiClient, ClientConfig};
use emporium_core::{
    Email, Extra, Order, OrderId, OrderItem, OrderRequest, OrderStatus, Payment, PaymentId,
    PaymentRequest, PaymentStatus, Product, ProductId, ProfileUpdate, User, UserId, UserRole,
};
use rust_decimal::Decimal;
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Payment method the stub payment service always declines.
pub const DECLINED_CARD: &str = "DECLINED_CARD";

const FIRST_ORDER_ID: i64 = 1000;
const FIRST_PAYMENT_ID: i64 = 5000;

type Shared = Arc<Mutex<ShopState>>;

struct Account {
    user: User,
    password: String,
    token: Option<String>,
}

struct ShopState {
    products: BTreeMap<ProductId, Product>,
    accounts: Vec<Account>,
    orders: Vec<Order>,
    payments: Vec<Payment>,
    next_user_id: i64,
    next_order_id: i64,
    next_payment_id: i64,
    tokens_issued: u64,
    hits: Vec<(Method, String)>,
}

impl ShopState {
    fn seeded() -> Self {
        let mut products = BTreeMap::new();
        for (id, name, price, stock, category) in [
            (1, "Ceramic Mug", Decimal::new(1250, 2), 10, "Kitchen"),
            (2, "Canvas Tote", Decimal::new(1800, 2), 3, "Bags"),
            (3, "Enamel Pin", Decimal::new(425, 2), 0, "Accessories"),
        ] {
            let mut product = Product::new(ProductId::new(id), name, price);
            product.stock = Some(stock);
            product.category = Some(category.to_string());
            product.active = Some(true);
            products.insert(product.id, product);
        }

        Self {
            products,
            accounts: Vec::new(),
            orders: Vec::new(),
            payments: Vec::new(),
            next_user_id: 1,
            next_order_id: FIRST_ORDER_ID,
            next_payment_id: FIRST_PAYMENT_ID,
            tokens_issued: 0,
            hits: Vec::new(),
        }
    }

    fn issue_token(&mut self, account: usize) -> Option<String> {
        self.tokens_issued += 1;
        let entry = self.accounts.get_mut(account)?;
        let token = format!("token-{}-{}", entry.user.id, self.tokens_issued);
        entry.token = Some(token.clone());
        Some(token)
    }

    fn caller(&self, headers: &HeaderMap) -> Option<usize> {
        let token = headers
            .get(header::AUTHORIZATION)?
            .to_str()
            .ok()?
            .strip_prefix("Bearer ")?;
        self.accounts
            .iter()
            .position(|a| a.token.as_deref() == Some(token))
    }
}

fn lock(state: &Shared) -> MutexGuard<'_, ShopState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn error(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "message": message }))).into_response()
}

fn unauthorized() -> Response {
    StatusCode::UNAUTHORIZED.into_response()
}

// =============================================================================
// StubBackend
// =============================================================================

/// A running stub of the shop API gateway. The server stops on drop.
pub struct StubBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl StubBackend {
    /// Bind to `127.0.0.1:0` and start serving.
    ///
    /// Seeded catalog:
    ///
    /// | id | name | price | stock |
    /// |---|---|---|---|
    /// | 1 | Ceramic Mug | 12.50 | 10 |
    /// | 2 | Canvas Tote | 18.00 | 3 |
    /// | 3 | Enamel Pin | 4.25 | 0 |
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(ShopState::seeded()));
        let app = router(Arc::clone(&state));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind stub backend");
        let addr = listener
            .local_addr()
            .expect("Failed to read stub backend address");

        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            state,
            server,
        }
    }

    /// Base URL the client should be configured with.
    #[must_use]
    pub fn api_url(&self) -> String {
        format!("http://{}/api", self.addr)
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Panics if the generated URL is rejected.
    #[must_use]
    pub fn config(&self, token_path: &Path) -> ClientConfig {
        let mut config =
            ClientConfig::for_api_url(&self.api_url()).expect("Stub URL should be valid");
        config.token_path = token_path.to_path_buf();
        config
    }

    /// A fresh transport for this backend.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    pub fn client(&self) -> Arc<ApiClient> {
        let config = self.config(Path::new("unused-session.json"));
        Arc::new(ApiClient::new(&config).expect("Failed to build API client"))
    }

    /// Number of requests received for `method path`.
    #[must_use]
    pub fn hits(&self, method: &Method, path: &str) -> usize {
        lock(&self.state)
            .hits
            .iter()
            .filter(|(m, p)| m == method && p == path)
            .count()
    }

    /// Current stock of a product.
    #[must_use]
    pub fn stock(&self, id: i64) -> Option<i32> {
        lock(&self.state)
            .products
            .get(&ProductId::new(id))
            .and_then(|p| p.stock)
    }

    /// Invalidate every issued token, as a server-side session expiry would.
    pub fn expire_sessions(&self) {
        for account in &mut lock(&self.state).accounts {
            account.token = None;
        }
    }
}

impl Drop for StubBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/products", get(list_products))
        .route("/api/products/search", post(search_products))
        .route("/api/products/{id}", get(get_product))
        .route("/api/products/{id}/inventory", put(update_inventory))
        .route("/api/users/register", post(register))
        .route("/api/users/login", post(login))
        .route("/api/users/profile", get(get_profile).put(update_profile))
        .route("/api/orders", post(create_order))
        .route("/api/orders/{id}", get(get_orders))
        .route("/api/orders/{id}/status", put(update_order_status))
        .route("/api/payments/process", post(process_payment))
        .route("/api/payments/refund", post(refund_payment))
        .route("/api/payments/{order_id}", get(get_payment))
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            record_hit,
        ))
        .with_state(state)
}

async fn record_hit(State(state): State<Shared>, request: Request, next: Next) -> Response {
    lock(&state)
        .hits
        .push((request.method().clone(), request.uri().path().to_string()));
    next.run(request).await
}

// =============================================================================
// Products
// =============================================================================

async fn list_products(State(state): State<Shared>) -> Response {
    let products: Vec<Product> = lock(&state).products.values().cloned().collect();
    Json(products).into_response()
}

async fn get_product(State(state): State<Shared>, UrlPath(id): UrlPath<i64>) -> Response {
    match lock(&state).products.get(&ProductId::new(id)) {
        Some(product) => Json(product.clone()).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            &format!("Product not found with id: {id}"),
        ),
    }
}

async fn search_products(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let query = body
        .get("query")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase();
    let results: Vec<Product> = lock(&state)
        .products
        .values()
        .filter(|p| p.name.to_lowercase().contains(&query))
        .cloned()
        .collect();
    Json(results).into_response()
}

async fn update_inventory(
    State(state): State<Shared>,
    UrlPath(id): UrlPath<i64>,
    Json(body): Json<Value>,
) -> Response {
    let Some(quantity) = body
        .get("quantity")
        .and_then(Value::as_i64)
        .and_then(|q| i32::try_from(q).ok())
    else {
        return error(StatusCode::BAD_REQUEST, "Quantity is required");
    };
    if quantity < 0 {
        return error(StatusCode::BAD_REQUEST, "Quantity cannot be negative");
    }

    let mut shop = lock(&state);
    match shop.products.get_mut(&ProductId::new(id)) {
        Some(product) => {
            product.stock = Some(quantity);
            Json(product.clone()).into_response()
        }
        None => error(
            StatusCode::NOT_FOUND,
            &format!("Product not found with id: {id}"),
        ),
    }
}

// =============================================================================
// Users
// =============================================================================

fn text_field(body: &Value, key: &str) -> Option<String> {
    body.get(key)
        .and_then(Value::as_str)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

async fn register(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let Some(email) = body
        .get("email")
        .and_then(Value::as_str)
        .and_then(|e| Email::parse(e).ok())
    else {
        return error(StatusCode::BAD_REQUEST, "Error: Email is invalid");
    };
    let Some(password) = text_field(&body, "password") else {
        return error(StatusCode::BAD_REQUEST, "Error: Password is required");
    };

    let mut shop = lock(&state);
    if shop.accounts.iter().any(|a| a.user.email == email) {
        return error(StatusCode::BAD_REQUEST, "Error: Email is already in use!");
    }

    let user = User {
        id: UserId::new(shop.next_user_id),
        email,
        first_name: text_field(&body, "firstName").unwrap_or_default(),
        last_name: text_field(&body, "lastName").unwrap_or_default(),
        phone: text_field(&body, "phone"),
        address: text_field(&body, "address"),
        role: UserRole::User,
        enabled: Some(true),
        created_at: None,
        updated_at: None,
        extra: Extra::new(),
    };
    shop.next_user_id += 1;
    shop.accounts.push(Account {
        user: user.clone(),
        password,
        token: None,
    });

    let index = shop.accounts.len() - 1;
    match shop.issue_token(index) {
        Some(token) => Json(json!({ "user": user, "token": token })).into_response(),
        None => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn login(State(state): State<Shared>, Json(body): Json<Value>) -> Response {
    let email = body.get("email").and_then(Value::as_str).unwrap_or_default();
    let password = body
        .get("password")
        .and_then(Value::as_str)
        .unwrap_or_default();

    let mut shop = lock(&state);
    let Some(index) = shop
        .accounts
        .iter()
        .position(|a| a.user.email.as_str() == email && a.password == password)
    else {
        return error(StatusCode::UNAUTHORIZED, "Error: Invalid email or password!");
    };

    let user = shop.accounts.get(index).map(|a| a.user.clone());
    match (user, shop.issue_token(index)) {
        (Some(user), Some(token)) => Json(json!({ "user": user, "token": token })).into_response(),
        _ => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

async fn get_profile(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let shop = lock(&state);
    match shop.caller(&headers).and_then(|i| shop.accounts.get(i)) {
        Some(account) => Json(account.user.clone()).into_response(),
        None => unauthorized(),
    }
}

async fn update_profile(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(update): Json<ProfileUpdate>,
) -> Response {
    let mut shop = lock(&state);
    let Some(index) = shop.caller(&headers) else {
        return unauthorized();
    };
    if update.phone.as_deref().is_some_and(|p| !p.chars().any(|c| c.is_ascii_digit())) {
        return error(StatusCode::BAD_REQUEST, "Phone number is invalid");
    }

    let Some(account) = shop.accounts.get_mut(index) else {
        return unauthorized();
    };
    let user = &mut account.user;
    if let Some(first_name) = update.first_name {
        user.first_name = first_name;
    }
    if let Some(last_name) = update.last_name {
        user.last_name = last_name;
    }
    if update.phone.is_some() {
        user.phone = update.phone;
    }
    if update.address.is_some() {
        user.address = update.address;
    }
    Json(user.clone()).into_response()
}

// =============================================================================
// Orders
// =============================================================================

async fn create_order(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(request): Json<OrderRequest>,
) -> Response {
    let mut shop = lock(&state);
    if shop.caller(&headers).is_none() {
        return unauthorized();
    }
    if request.items.is_empty() {
        return error(StatusCode::BAD_REQUEST, "Order must contain at least one item");
    }

    let mut items = Vec::with_capacity(request.items.len());
    for line in &request.items {
        let Some(product) = shop.products.get(&line.product_id) else {
            return error(
                StatusCode::NOT_FOUND,
                &format!("Product not found with id: {}", line.product_id),
            );
        };
        let available = u32::try_from(product.stock.unwrap_or_default()).unwrap_or(0);
        if line.quantity > available {
            return error(
                StatusCode::BAD_REQUEST,
                &format!("Insufficient stock for product: {}", product.name),
            );
        }
        let subtotal = product.price * Decimal::from(line.quantity);
        items.push(OrderItem {
            id: None,
            product_id: product.id,
            product_name: product.name.clone(),
            price: product.price,
            quantity: line.quantity,
            subtotal: Some(subtotal),
        });
    }

    for line in &request.items {
        if let Some(product) = shop.products.get_mut(&line.product_id) {
            let taken = i32::try_from(line.quantity).unwrap_or(i32::MAX);
            product.stock = product.stock.map(|s| s - taken);
        }
    }

    let order = Order {
        id: OrderId::new(shop.next_order_id),
        user_id: Some(request.user_id),
        status: OrderStatus::Pending,
        total_amount: Some(items.iter().map(OrderItem::line_total).sum()),
        shipping_address: Some(request.shipping_address),
        billing_address: request.billing_address,
        payment_method: request.payment_method,
        items,
        created_at: None,
        updated_at: None,
        extra: Extra::new(),
    };
    shop.next_order_id += 1;
    shop.orders.push(order.clone());
    (StatusCode::CREATED, Json(order)).into_response()
}

/// Order by id when one exists, otherwise the orders of the user with that id.
async fn get_orders(
    State(state): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<i64>,
) -> Response {
    let shop = lock(&state);
    if shop.caller(&headers).is_none() {
        return unauthorized();
    }

    if let Some(order) = shop.orders.iter().find(|o| o.id == OrderId::new(id)) {
        return Json(order.clone()).into_response();
    }
    if id >= FIRST_ORDER_ID {
        return error(
            StatusCode::NOT_FOUND,
            &format!("Order not found with id: {id}"),
        );
    }

    let orders: Vec<Order> = shop
        .orders
        .iter()
        .filter(|o| o.user_id == Some(UserId::new(id)))
        .cloned()
        .collect();
    Json(orders).into_response()
}

async fn update_order_status(
    State(state): State<Shared>,
    headers: HeaderMap,
    UrlPath(id): UrlPath<i64>,
    Json(body): Json<Value>,
) -> Response {
    let mut shop = lock(&state);
    if shop.caller(&headers).is_none() {
        return unauthorized();
    }
    let Some(status) = body
        .get("status")
        .cloned()
        .and_then(|s| serde_json::from_value::<OrderStatus>(s).ok())
    else {
        return error(StatusCode::BAD_REQUEST, "Invalid order status");
    };

    match shop.orders.iter_mut().find(|o| o.id == OrderId::new(id)) {
        Some(order) => {
            order.status = status;
            Json(order.clone()).into_response()
        }
        None => error(
            StatusCode::NOT_FOUND,
            &format!("Order not found with id: {id}"),
        ),
    }
}

// =============================================================================
// Payments
// =============================================================================

fn set_order_status(shop: &mut ShopState, order_id: OrderId, status: OrderStatus) {
    if let Some(order) = shop.orders.iter_mut().find(|o| o.id == order_id) {
        order.status = status;
    }
}

async fn process_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(request): Json<PaymentRequest>,
) -> Response {
    let mut shop = lock(&state);
    if shop.caller(&headers).is_none() {
        return unauthorized();
    }
    if !shop.orders.iter().any(|o| o.id == request.order_id) {
        return error(
            StatusCode::NOT_FOUND,
            &format!("Order not found with id: {}", request.order_id),
        );
    }
    if request.payment_method == DECLINED_CARD {
        return error(StatusCode::PAYMENT_REQUIRED, "Payment declined by issuer");
    }

    let id = shop.next_payment_id;
    shop.next_payment_id += 1;
    let payment = Payment {
        id: PaymentId::new(id),
        order_id: request.order_id,
        user_id: request.user_id,
        amount: request.amount,
        payment_method: request.payment_method,
        status: PaymentStatus::Completed,
        payment_reference: Some(format!("PAY-{id}")),
        failure_reason: None,
        created_at: None,
        updated_at: None,
        extra: Extra::new(),
    };
    set_order_status(&mut shop, payment.order_id, OrderStatus::Confirmed);
    shop.payments.push(payment.clone());
    Json(payment).into_response()
}

async fn refund_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let mut shop = lock(&state);
    if shop.caller(&headers).is_none() {
        return unauthorized();
    }
    let Some(payment_id) = body.get("paymentId").and_then(Value::as_i64) else {
        return error(StatusCode::BAD_REQUEST, "paymentId is required");
    };

    let Some(payment) = shop
        .payments
        .iter_mut()
        .find(|p| p.id == PaymentId::new(payment_id))
    else {
        return error(
            StatusCode::NOT_FOUND,
            &format!("Payment not found with id: {payment_id}"),
        );
    };
    if payment.status != PaymentStatus::Completed {
        return error(
            StatusCode::BAD_REQUEST,
            "Only completed payments can be refunded",
        );
    }
    payment.status = PaymentStatus::Refunded;
    let payment = payment.clone();
    set_order_status(&mut shop, payment.order_id, OrderStatus::Refunded);
    Json(payment).into_response()
}

async fn get_payment(
    State(state): State<Shared>,
    headers: HeaderMap,
    UrlPath(order_id): UrlPath<i64>,
) -> Response {
    let shop = lock(&state);
    if shop.caller(&headers).is_none() {
        return unauthorized();
    }
    match shop
        .payments
        .iter()
        .rev()
        .find(|p| p.order_id == OrderId::new(order_id))
    {
        Some(payment) => Json(payment.clone()).into_response(),
        None => error(
            StatusCode::NOT_FOUND,
            &format!("Payment not found for order: {order_id}"),
        ),
    }
}
