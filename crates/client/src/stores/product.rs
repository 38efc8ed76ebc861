//! Product catalog state.

use std::sync::Arc;

use emporium_core::{Product, ProductId};
use tokio::sync::watch;
use tracing::instrument;

use super::{ActionStatus, StatusTracker};
use crate::api::Transport;
use crate::error::ApiError;
use crate::services;

/// Loaded catalog, the product being viewed, and the last search results.
pub struct ProductStore<T> {
    api: Arc<T>,
    products: Vec<Product>,
    current_product: Option<Product>,
    search_results: Vec<Product>,
    status: StatusTracker,
}

impl<T: Transport> ProductStore<T> {
    #[must_use]
    pub fn new(api: Arc<T>) -> Self {
        Self {
            api,
            products: Vec::new(),
            current_product: None,
            search_results: Vec::new(),
            status: StatusTracker::new("product"),
        }
    }

    /// Replace the loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Failed to fetch products".
    #[instrument(skip(self))]
    pub async fn fetch_products(&mut self) -> Result<Vec<Product>, ApiError> {
        let _loading = self.status.begin();
        match services::product::get_products(&*self.api).await {
            Ok(products) => {
                self.products.clone_from(&products);
                self.status.succeed("fetch_products");
                Ok(products)
            }
            Err(e) => Err(self.status.fail("fetch_products", "Failed to fetch products", e)),
        }
    }

    /// Load one product as the current product.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Failed to fetch product".
    #[instrument(skip(self))]
    pub async fn fetch_product(&mut self, id: ProductId) -> Result<Product, ApiError> {
        let _loading = self.status.begin();
        match services::product::get_product(&*self.api, id).await {
            Ok(product) => {
                self.current_product = Some(product.clone());
                self.status.succeed("fetch_product");
                Ok(product)
            }
            Err(e) => Err(self.status.fail("fetch_product", "Failed to fetch product", e)),
        }
    }

    /// Run a search and keep its results.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Search failed".
    #[instrument(skip(self))]
    pub async fn search_products(&mut self, query: &str) -> Result<Vec<Product>, ApiError> {
        let _loading = self.status.begin();
        match services::product::search_products(&*self.api, query).await {
            Ok(results) => {
                self.search_results.clone_from(&results);
                self.status.succeed("search_products");
                Ok(results)
            }
            Err(e) => Err(self.status.fail("search_products", "Search failed", e)),
        }
    }

    /// Set stock for a product and refresh it in the loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns the service error; fallback message "Failed to update inventory".
    #[instrument(skip(self))]
    pub async fn update_inventory(
        &mut self,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<Product, ApiError> {
        let _loading = self.status.begin();
        match services::product::update_inventory(&*self.api, product_id, quantity).await {
            Ok(product) => {
                if let Some(existing) = self.products.iter_mut().find(|p| p.id == product_id) {
                    *existing = product.clone();
                }
                self.status.succeed("update_inventory");
                Ok(product)
            }
            Err(e) => Err(self
                .status
                .fail("update_inventory", "Failed to update inventory", e)),
        }
    }

    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn current_product(&self) -> Option<&Product> {
        self.current_product.as_ref()
    }

    #[must_use]
    pub fn search_results(&self) -> &[Product] {
        &self.search_results
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
