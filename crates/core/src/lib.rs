//! Cartwright Core - Shared domain types.
//!
//! This crate provides the types shared by every Cartwright component:
//! - `storefront` - Order placement, inventory and cart HTTP service
//! - `cli` - Command-line tools for migrations, seeding and restocking
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. This keeps it lightweight and lets both the server
//! and cart sync clients agree on the same normalization rules.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, quantities and money amounts
//! - [`cart`] - Client-supplied cart lines and their normalization
//! - [`checkout`] - Checkout attempt stages and profile payloads

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod checkout;
pub mod types;

pub use cart::{CartLineInput, CartPayload, RawCartLine, normalize_cart_lines};
pub use checkout::{CheckoutStage, PaymentInfo, RejectReason, ShippingInfo};
pub use types::*;
