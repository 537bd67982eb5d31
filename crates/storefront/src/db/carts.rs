//! Cart store: persisted per-user cart lines.

use std::future::Future;

use cartwright_core::{CartLineInput, UserId};

use super::RepositoryError;
use crate::models::CartItemView;

/// Per-user cart lines keyed by `(user, product)`.
///
/// Callers pass lines that have already been normalized (deduplicated, all
/// quantities positive). Lines come back in insertion order: a product that
/// stays in the cart across a `replace` keeps its position.
pub trait CartStore {
    /// The user's cart, first-added product first.
    fn cart_lines(
        &mut self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<CartItemView>, RepositoryError>> + Send;

    /// Make the stored cart exactly equal to `lines`.
    ///
    /// Lines absent from `lines` are deleted; present ones are created or have
    /// their quantity overwritten. Fails with `NotFound` for an unknown product.
    fn replace_cart(
        &mut self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Add each line's quantity to what is stored, creating missing lines.
    fn merge_cart(
        &mut self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every line. Returns the number of lines removed.
    fn clear_cart(
        &mut self,
        user: UserId,
    ) -> impl Future<Output = Result<u64, RepositoryError>> + Send;
}
