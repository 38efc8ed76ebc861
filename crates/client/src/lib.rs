//! Emporium shop client.
//!
//! Talks to the shop's REST gateway and keeps client-side state for the
//! catalog, cart, orders, and signed-in user.
//!
//! # Layers
//!
//! - [`api`]: the [`Transport`] seam and the `reqwest` [`ApiClient`]
//! - [`services`]: one function per backend endpoint
//! - [`stores`]: stateful order, product, and user stores with a shared
//!   loading/error envelope
//! - [`session`]: token persistence between runs
//! - [`config`]: environment configuration
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use emporium_client::{ApiClient, ClientConfig, FileTokenStore, ProductStore, UserStore};
//!
//! let config = ClientConfig::from_env()?;
//! let api = Arc::new(ApiClient::new(&config)?);
//!
//! let mut users = UserStore::new(Arc::clone(&api), FileTokenStore::new(&config.token_path));
//! users.initialize_auth().await;
//!
//! let mut products = ProductStore::new(api);
//! for product in products.fetch_products().await? {
//!     println!("{} {}", product.name, product.price);
//! }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod config;
pub mod error;
pub mod services;
pub mod session;
pub mod stores;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use api::{ApiClient, ApiRequest, Transport};
pub use config::{ClientConfig, ConfigError};
pub use error::ApiError;
pub use services::user::{AuthSession, Credentials, Registration};
pub use session::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
pub use stores::{ActionStatus, OrderStore, ProductStore, SessionState, UserStore};
