//! Cartwright storefront core.
//!
//! Order placement, inventory and server-side carts behind a JSON API, plus
//! the client-side cart reconciler that keeps a local cart in sync with it.
//! The binary in `main.rs` wires these to `PostgreSQL`; tests use
//! [`db::MemoryStore`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
