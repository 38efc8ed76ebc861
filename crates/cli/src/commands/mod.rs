//! Command implementations.
//!
//! Each command builds the stores it needs over one shared [`ApiClient`],
//! so a session restored by the user store authenticates every other call.

pub mod account;
pub mod catalog;
pub mod orders;

use std::io::{self, BufRead, Write};
use std::sync::Arc;

use emporium_client::{
    ActionStatus, ApiClient, ApiError, ClientConfig, FileTokenStore, OrderStore, ProductStore,
    UserStore,
};
use emporium_core::{EmailError, ProductId, User};
use secrecy::SecretString;
use thiserror::Error;

/// Errors surfaced to the terminal.
#[derive(Debug, Error)]
pub enum CliError {
    /// A store action failed; `message` is what the store reported.
    #[error("{message}")]
    Action {
        message: String,
        #[source]
        source: ApiError,
    },

    /// Transport could not be built.
    #[error("Client setup failed: {0}")]
    Setup(#[source] ApiError),

    #[error("Invalid email: {0}")]
    Email(#[from] EmailError),

    #[error("Not signed in. Run `emporium login` first.")]
    NotSignedIn,

    #[error("Password must not be empty")]
    EmptyPassword,

    #[error("Failed to read from stdin: {0}")]
    Stdin(#[from] io::Error),
}

impl CliError {
    /// Wrap a failed store action, preferring the store's user-facing message.
    pub fn action(status: ActionStatus, source: ApiError) -> Self {
        let message = status.error.unwrap_or_else(|| source.to_string());
        Self::Action { message, source }
    }
}

/// Shared handles for one CLI invocation.
pub struct Context {
    pub config: ClientConfig,
    pub api: Arc<ApiClient>,
}

impl Context {
    pub fn new(config: ClientConfig) -> Result<Self, CliError> {
        let api = Arc::new(ApiClient::new(&config).map_err(CliError::Setup)?);
        Ok(Self { config, api })
    }

    pub fn user_store(&self) -> UserStore<ApiClient, FileTokenStore> {
        UserStore::new(
            Arc::clone(&self.api),
            FileTokenStore::new(&self.config.token_path),
        )
    }

    pub fn product_store(&self) -> ProductStore<ApiClient> {
        ProductStore::new(Arc::clone(&self.api))
    }

    pub fn order_store(&self) -> OrderStore<ApiClient> {
        OrderStore::new(Arc::clone(&self.api))
    }

    /// Resume the saved session and return its user.
    pub async fn signed_in_user(&self) -> Result<User, CliError> {
        let mut users = self.user_store();
        users.initialize_auth().await.ok_or(CliError::NotSignedIn)
    }
}

/// One `--item` argument of `checkout`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
}

/// Parse `ID` or `ID:QUANTITY`.
pub fn parse_cart_line(raw: &str) -> Result<CartLine, String> {
    let (id, quantity) = match raw.split_once(':') {
        Some((id, quantity)) => {
            let quantity = quantity
                .trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid quantity '{quantity}': {e}"))?;
            (id, quantity)
        }
        None => (raw, 1),
    };
    if quantity == 0 {
        return Err("quantity must be at least 1".to_string());
    }
    let product_id = id
        .parse::<ProductId>()
        .map_err(|e| format!("invalid product id '{id}': {e}"))?;

    Ok(CartLine {
        product_id,
        quantity,
    })
}

/// Read a password from the first line of stdin.
pub fn read_password() -> Result<SecretString, CliError> {
    #[allow(clippy::print_stderr)]
    {
        eprint!("Password: ");
    }
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::EmptyPassword);
    }
    Ok(SecretString::from(password))
}
