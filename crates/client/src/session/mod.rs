//! Session token persistence.
//!
//! The user store keeps the bearer token in memory and mirrors it to a
//! [`TokenStore`] so a later run can restore the session with
//! `initialize_auth`. The token is the only thing persisted.

mod token;

pub use token::{FileTokenStore, MemoryTokenStore, TokenStore, TokenStoreError};
