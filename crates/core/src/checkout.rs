//! Checkout attempt lifecycle and profile payloads.
//!
//! A single checkout attempt moves through
//! `Received -> PaymentChecked -> StockValidated -> Committed`, or is
//! `Rejected` from any stage before `Committed`. Nothing outside the attempt can
//! observe a stage other than the terminal one.

use serde::{Deserialize, Serialize};

/// Why a checkout attempt was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    /// Malformed or missing request fields.
    Validation,
    /// Unknown user or product.
    NotFound,
    /// A line asked for more units than are available.
    OutOfStock,
    /// The payment gate declined the attempt.
    PaymentDenied,
    /// Storage or transaction infrastructure fault.
    Internal,
}

/// Stage of a single checkout attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case", tag = "stage", content = "reason")]
pub enum CheckoutStage {
    #[default]
    Received,
    PaymentChecked,
    StockValidated,
    Committed,
    Rejected(RejectReason),
}

/// An illegal stage transition.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("cannot leave terminal checkout stage {0:?}")]
pub struct StageError(pub CheckoutStage);

impl CheckoutStage {
    /// Whether the attempt has finished (successfully or not).
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::Rejected(_))
    }

    /// Move to the next stage on the success path.
    ///
    /// # Errors
    ///
    /// Returns `StageError` if the attempt is already terminal.
    pub const fn advance(self) -> Result<Self, StageError> {
        match self {
            Self::Received => Ok(Self::PaymentChecked),
            Self::PaymentChecked => Ok(Self::StockValidated),
            Self::StockValidated => Ok(Self::Committed),
            Self::Committed | Self::Rejected(_) => Err(StageError(self)),
        }
    }

    /// Abort the attempt.
    ///
    /// # Errors
    ///
    /// Returns `StageError` if the attempt is already terminal; a committed
    /// order cannot be rejected after the fact.
    pub const fn reject(self, reason: RejectReason) -> Result<Self, StageError> {
        if self.is_terminal() {
            return Err(StageError(self));
        }
        Ok(Self::Rejected(reason))
    }
}

/// Shipping fields optionally saved as the user's default profile.
///
/// `None` means "leave the stored value unchanged".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingInfo {
    pub shipping_address: Option<String>,
    pub shipping_address2: Option<String>,
    pub shipping_country: Option<String>,
    pub shipping_state: Option<String>,
    pub shipping_zip: Option<String>,
}

/// Payment fields optionally saved as the user's default profile.
///
/// Stored verbatim; hardening card storage is out of scope for this service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentInfo {
    pub card_name: Option<String>,
    pub card_number: Option<String>,
    pub card_expiry: Option<String>,
}

impl ShippingInfo {
    /// Whether no field would be written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.shipping_address.is_none()
            && self.shipping_address2.is_none()
            && self.shipping_country.is_none()
            && self.shipping_state.is_none()
            && self.shipping_zip.is_none()
    }
}

impl PaymentInfo {
    /// Whether no field would be written.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.card_name.is_none() && self.card_number.is_none() && self.card_expiry.is_none()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_success_path() {
        let stage = CheckoutStage::default();
        let stage = stage.advance().unwrap();
        assert_eq!(stage, CheckoutStage::PaymentChecked);
        let stage = stage.advance().unwrap().advance().unwrap();
        assert_eq!(stage, CheckoutStage::Committed);
        assert!(stage.is_terminal());
        assert!(stage.advance().is_err());
    }

    #[test]
    fn test_reject_from_any_open_stage() {
        for stage in [
            CheckoutStage::Received,
            CheckoutStage::PaymentChecked,
            CheckoutStage::StockValidated,
        ] {
            assert_eq!(
                stage.reject(RejectReason::OutOfStock).unwrap(),
                CheckoutStage::Rejected(RejectReason::OutOfStock)
            );
        }
    }

    #[test]
    fn test_committed_cannot_be_rejected() {
        assert!(
            CheckoutStage::Committed
                .reject(RejectReason::Internal)
                .is_err()
        );
        assert!(
            CheckoutStage::Rejected(RejectReason::Validation)
                .reject(RejectReason::Internal)
                .is_err()
        );
    }

    #[test]
    fn test_profile_payloads_use_camel_case() {
        let shipping: ShippingInfo =
            serde_json::from_str(r#"{"shippingAddress":"1 Main St","shippingZip":"12345"}"#)
                .unwrap();
        assert_eq!(shipping.shipping_address.as_deref(), Some("1 Main St"));
        assert!(shipping.shipping_country.is_none());
        assert!(!shipping.is_empty());
        assert!(PaymentInfo::default().is_empty());
    }
}
