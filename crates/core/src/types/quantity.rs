//! Strictly positive line quantities.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum QuantityError {
    /// Zero or negative.
    #[error("quantity must be positive (got {0})")]
    NotPositive(i64),
    /// Larger than a stored `int4` column can hold.
    #[error("quantity {0} is too large")]
    TooLarge(i64),
}

/// A positive number of units of one product.
///
/// Cart lines and order lines never carry a zero or negative quantity; a line
/// that would drop to zero is deleted instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i32")]
pub struct Quantity(i32);

impl Quantity {
    /// One unit.
    pub const ONE: Self = Self(1);

    /// Create a quantity from an untrusted integer.
    ///
    /// # Errors
    ///
    /// Returns `QuantityError::NotPositive` for values `<= 0` and
    /// `QuantityError::TooLarge` for values above `i32::MAX`.
    pub fn new(value: i64) -> Result<Self, QuantityError> {
        if value <= 0 {
            return Err(QuantityError::NotPositive(value));
        }
        i32::try_from(value)
            .map(Self)
            .map_err(|_| QuantityError::TooLarge(value))
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> i32 {
        self.0
    }

    /// Add two quantities, clamping at the largest storable value.
    #[must_use]
    pub const fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Remove one unit. Returns `None` when the line would reach zero.
    #[must_use]
    pub const fn decremented(self) -> Option<Self> {
        if self.0 > 1 { Some(Self(self.0 - 1)) } else { None }
    }
}

impl TryFrom<i64> for Quantity {
    type Error = QuantityError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i32 {
    fn from(q: Quantity) -> Self {
        q.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_zero_and_negative() {
        assert_eq!(Quantity::new(0), Err(QuantityError::NotPositive(0)));
        assert_eq!(Quantity::new(-2), Err(QuantityError::NotPositive(-2)));
    }

    #[test]
    fn test_rejects_overflowing_values() {
        let too_big = i64::from(i32::MAX) + 1;
        assert_eq!(Quantity::new(too_big), Err(QuantityError::TooLarge(too_big)));
    }

    #[test]
    fn test_saturating_add_clamps() {
        let max = Quantity::new(i64::from(i32::MAX)).unwrap();
        assert_eq!(max.saturating_add(Quantity::ONE), max);
        assert_eq!(Quantity::ONE.saturating_add(Quantity::ONE).get(), 2);
    }

    #[test]
    fn test_decremented_drops_at_one() {
        assert_eq!(Quantity::ONE.decremented(), None);
        assert_eq!(Quantity::new(3).unwrap().decremented().unwrap().get(), 2);
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<Quantity>("0").is_err());
        assert_eq!(serde_json::from_str::<Quantity>("4").unwrap().get(), 4);
    }
}
