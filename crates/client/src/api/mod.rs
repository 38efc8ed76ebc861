//! HTTP transport for the shop API gateway.
//!
//! # Architecture
//!
//! - [`Transport`] is the seam every service call goes through: one JSON
//!   request in, one JSON value (or [`ApiError`]) out
//! - [`ApiClient`] is the production transport over `reqwest`
//! - The bearer token is held by the transport and attached to every
//!   request; the user store sets and clears it
//! - No caching, no retries: each call is exactly one HTTP round trip
//!
//! # Example
//!
//! ```rust,ignore
//! use emporium_client::{ApiClient, ClientConfig, services};
//!
//! let api = ApiClient::new(&ClientConfig::from_env()?)?;
//! let products = services::product::get_products(&api).await?;
//! ```

use std::future::Future;
use std::sync::Arc;

use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, instrument, warn};

use crate::config::ClientConfig;
use crate::error::ApiError;

/// A single request to the shop API.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, starting with `/`.
    pub path: String,
    /// JSON body, if the request carries one.
    pub body: Option<Value>,
}

impl ApiRequest {
    /// `GET path`.
    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self {
            method: Method::GET,
            path: path.into(),
            body: None,
        }
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if `body` cannot be represented as JSON.
    pub fn post(path: impl Into<String>, body: &impl Serialize) -> Result<Self, ApiError> {
        Self::with_body(Method::POST, path, body)
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Parse` if `body` cannot be represented as JSON.
    pub fn put(path: impl Into<String>, body: &impl Serialize) -> Result<Self, ApiError> {
        Self::with_body(Method::PUT, path, body)
    }

    fn with_body(
        method: Method,
        path: impl Into<String>,
        body: &impl Serialize,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            method,
            path: path.into(),
            body: Some(serde_json::to_value(body)?),
        })
    }
}

/// Sends requests to the shop backend.
///
/// Implementations must be shareable across stores; all stores of one
/// session hold the same transport so a login attaches the token for every
/// subsequent call.
pub trait Transport: Send + Sync {
    /// Send `request` and return the decoded JSON response body.
    ///
    /// An empty success body decodes as `Value::Null`.
    fn send(&self, request: ApiRequest) -> impl Future<Output = Result<Value, ApiError>> + Send;

    /// Set or clear the bearer token attached to subsequent requests.
    fn set_bearer_token(&self, token: Option<SecretString>) -> impl Future<Output = ()> + Send;
}

// =============================================================================
// ApiClient
// =============================================================================

/// `reqwest`-backed [`Transport`].
///
/// Cheaply cloneable; clones share the connection pool and the token.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    token: RwLock<Option<SecretString>>,
}

impl ApiClient {
    /// Create a client for the configured API base URL.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the HTTP client fails to build.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.as_str().trim_end_matches('/').to_string(),
                token: RwLock::new(None),
            }),
        })
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Whether a bearer token is currently attached.
    pub async fn has_bearer_token(&self) -> bool {
        self.inner.token.read().await.is_some()
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.base_url)
    }
}

impl Transport for ApiClient {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn send(&self, request: ApiRequest) -> Result<Value, ApiError> {
        let token = self.inner.token.read().await.clone();

        let mut builder = self
            .inner
            .client
            .request(request.method, self.url(&request.path));
        if let Some(token) = &token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status();

        // Get response body as text first for better error diagnostics
        let response_text = response.text().await?;

        if !status.is_success() {
            warn!(
                status = %status,
                body = %response_text.chars().take(500).collect::<String>(),
                "Shop API returned non-success status"
            );
            return Err(ApiError::from_response(status.as_u16(), &response_text));
        }

        debug!(status = %status, bytes = response_text.len(), "Shop API response");

        if response_text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&response_text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %response_text.chars().take(500).collect::<String>(),
                "Failed to parse shop API response"
            );
            ApiError::Parse(e)
        })
    }

    async fn set_bearer_token(&self, token: Option<SecretString>) {
        *self.inner.token.write().await = token;
    }
}
