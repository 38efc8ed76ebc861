//! Emporium Core - Shared domain types and cart logic.
//!
//! This crate provides the types used across all Emporium components:
//! - `client` - API transport, services, and state stores
//! - `cli` - Command-line front end
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no persistence. This keeps it lightweight and trivially
//! testable.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, and statuses
//! - [`models`] - Wire payloads exchanged with the shop backend
//! - [`cart`] - Client-local shopping cart

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod models;
pub mod types;

pub use cart::{Cart, CartItem};
pub use models::*;
pub use types::*;
