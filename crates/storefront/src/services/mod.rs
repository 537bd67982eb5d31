//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `cart` - Server-side cart reads and writes
//! - `checkout` - Order transactions (stock, payment, order rows)
//! - `payment` - Card authorization gates
//! - `reconciler` - Client-side cart sync against the cart endpoints

pub mod cart;
pub mod checkout;
pub mod payment;
pub mod reconciler;
