//! Stock ledger: the only writer of `product.stock`.

use std::future::Future;

use cartwright_core::{ProductId, Quantity};

use super::RepositoryError;

/// Outcome of a stock check or decrement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StockCheck {
    /// Enough units were available (and, for a decrement, have been taken).
    Ok,
    /// Fewer units than requested are available; nothing was changed.
    Insufficient { title: String, available: i32 },
    /// No such product.
    NotFound,
}

impl StockCheck {
    #[must_use]
    pub const fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Per-product available quantity.
///
/// Stock never goes below zero. `decrement` is conditioned on the value current
/// at the time of the write, not on an earlier read, so two concurrent
/// decrements of the last unit cannot both succeed.
pub trait StockLedger {
    /// Read-only pre-check.
    fn check_available(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<StockCheck, RepositoryError>> + Send;

    /// Take `quantity` units if at least that many are available.
    fn decrement(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<StockCheck, RepositoryError>> + Send;

    /// Return units to stock. Returns the new level.
    ///
    /// Fails with `RepositoryError::NotFound` for an unknown product.
    fn increment(
        &mut self,
        product: ProductId,
        quantity: Quantity,
    ) -> impl Future<Output = Result<i32, RepositoryError>> + Send;

    /// Administrative absolute stock level. Returns the new level.
    fn set_level(
        &mut self,
        product: ProductId,
        level: u32,
    ) -> impl Future<Output = Result<i32, RepositoryError>> + Send;
}
