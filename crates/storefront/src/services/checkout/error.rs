//! Checkout error types.

use thiserror::Error;

use cartwright_core::RejectReason;

use crate::db::RepositoryError;

/// Errors that can end a checkout attempt.
///
/// Every variant except `Repository` and `Internal` carries a message meant
/// for the shopper.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Malformed or missing request fields.
    #[error("{0}")]
    Validation(&'static str),

    /// Unknown user or product.
    #[error("{0}")]
    NotFound(&'static str),

    /// A line asked for more units than are in stock.
    #[error("Product \"{title}\" is out of stock!")]
    OutOfStock { title: String },

    /// The payment gate declined the attempt.
    #[error("Credit Card Authorization Failed.")]
    PaymentDenied,

    /// Storage failure; nothing was applied.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Engine invariant broken; nothing was applied.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CheckoutError {
    pub const MISSING_USER: Self = Self::Validation("userId is required (login/register first)");
    pub const EMPTY_CART: Self = Self::Validation("Cart is empty");
    pub const INVALID_TOTAL: Self = Self::Validation("Invalid totalAmount");
    pub const INVALID_ITEM: Self = Self::Validation("Invalid cart item");
    pub const INVALID_PROFILE: Self = Self::Validation("Invalid shipping or payment details");
    pub const UNKNOWN_USER: Self = Self::NotFound("User not found. Please login again.");
    pub const UNKNOWN_PRODUCT: Self = Self::NotFound("Product not found");

    /// The stage-machine rejection reason for this error.
    #[must_use]
    pub const fn reason(&self) -> RejectReason {
        match self {
            Self::Validation(_) => RejectReason::Validation,
            Self::NotFound(_) => RejectReason::NotFound,
            Self::OutOfStock { .. } => RejectReason::OutOfStock,
            Self::PaymentDenied => RejectReason::PaymentDenied,
            Self::Repository(_) | Self::Internal(_) => RejectReason::Internal,
        }
    }
}
