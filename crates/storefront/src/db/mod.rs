//! Persistence for the storefront core.
//!
//! # Database: `cartwright`
//!
//! Everything lives in the `shop` schema of a single `PostgreSQL` database so
//! that an order, its lines, the stock decrements and the cart clear can be
//! committed as one transaction.
//!
//! ## Tables
//!
//! - `product` - Catalog rows; `stock` is owned by the stock ledger
//! - `user` - Accounts plus optional default shipping/payment profile
//! - `cart_item` - Persisted cart lines, unique on `(user_id, product_id)`
//! - `order` / `order_item` - Append-only order history
//!
//! # Store abstraction
//!
//! Services never talk to a pool directly. They open a [`Store::begin`]
//! transaction and use the capability traits implemented on it:
//!
//! - [`StockLedger`] - conditional decrement, increment, absolute set
//! - [`CartStore`] - replace / merge / clear semantics for cart lines
//! - [`OrderBook`] - order insertion and history
//! - [`UserDirectory`] - user lookup and profile updates
//! - [`Catalog`] - product lookup and insertion
//!
//! Dropping a transaction without calling [`Transaction::commit`] discards
//! every effect made through it. [`PgStore`] is the production implementation;
//! [`MemoryStore`] serializes transactions behind a lock and is used by tests
//! and local development.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/storefront/migrations/` and run via:
//! ```bash
//! cargo run -p cartwright-cli -- migrate
//! ```

pub mod carts;
pub mod memory;
pub mod orders;
pub mod postgres;
pub mod products;
pub mod stock;
pub mod users;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use carts::CartStore;
pub use memory::{Fault, MemoryStore, MemoryTx};
pub use orders::OrderBook;
pub use postgres::{PgStore, PgTx};
pub use products::Catalog;
pub use stock::{StockCheck, StockLedger};
pub use users::UserDirectory;

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Errors that can occur in repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database query failed.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in database is invalid/corrupted.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Record not found.
    #[error("not found")]
    NotFound,

    /// Unique constraint violation.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Injected failure from the in-memory store.
    #[error("injected fault: {0:?}")]
    Injected(Fault),
}

/// A handle that opens transactions.
pub trait Store: Clone + Send + Sync + 'static {
    /// The transaction type handed out by [`Store::begin`].
    type Tx: Transaction;

    /// Open a new transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, RepositoryError>> + Send;

    /// Round-trip to the backing store (readiness probe).
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// An open unit of work. Effects are only visible to others after `commit`.
pub trait Transaction:
    StockLedger + CartStore + OrderBook + UserDirectory + Catalog + Send + Sized
{
    /// Durably apply every effect made through this transaction.
    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Map a unique-constraint violation to `Conflict`, other errors to `Database`.
pub(crate) fn conflict_on_unique(e: sqlx::Error, what: &str) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        return RepositoryError::Conflict(format!("{what} already exists"));
    }
    RepositoryError::Database(e)
}

/// Map a foreign-key violation (unknown user or product) to `NotFound`.
pub(crate) fn not_found_on_foreign_key(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}
