//! Non-negative money amounts using decimal arithmetic.
//!
//! Order totals are recorded exactly as the caller declared them, so the only
//! checks here are the ones that keep a total storable: it must be a finite,
//! non-negative number no larger than [`Amount::MAX`].

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::FromPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Errors that can occur when interpreting a declared amount.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    /// The value is absent, not numeric, or not representable as a decimal.
    #[error("amount must be a finite number")]
    NotANumber,
    /// The value is below zero.
    #[error("amount must not be negative")]
    Negative,
    /// The value does not fit the stored precision.
    #[error("amount exceeds {}", Amount::MAX)]
    TooLarge,
}

/// A monetary amount in the store currency's standard unit (e.g. dollars).
///
/// Always `>= 0` and `<= Amount::MAX`. Rounded to two decimal places on
/// construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(Decimal);

impl Amount {
    /// The zero amount.
    pub const ZERO: Self = Self(Decimal::ZERO);

    /// The largest amount an order total column (`NUMERIC(12, 2)`) holds.
    pub const MAX: Self = Self(Decimal::from_parts(3_567_587_327, 232, 0, false, 2));

    /// Create an amount from a decimal.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::Negative` if `value < 0` and
    /// `AmountError::TooLarge` if it rounds to more than `Amount::MAX`.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }
        let rounded = value.round_dp(2);
        if rounded > Self::MAX.0 {
            return Err(AmountError::TooLarge);
        }
        Ok(Self(rounded))
    }

    /// Interpret a client-declared amount.
    ///
    /// Accepts JSON numbers and numeric strings (`"59.90"`), matching how web
    /// clients commonly post totals.
    ///
    /// # Errors
    ///
    /// Returns `AmountError::NotANumber` for anything that is not a finite
    /// number, `AmountError::Negative` for values below zero and
    /// `AmountError::TooLarge` above `Amount::MAX`.
    pub fn from_declared(value: &Value) -> Result<Self, AmountError> {
        let decimal = match value {
            Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Decimal::from(i)
                } else {
                    let f = n.as_f64().ok_or(AmountError::NotANumber)?;
                    decimal_from_f64(f)?
                }
            }
            Value::String(s) => {
                let trimmed = s.trim();
                trimmed
                    .parse::<Decimal>()
                    .or_else(|_| {
                        trimmed
                            .parse::<f64>()
                            .map_err(|_| AmountError::NotANumber)
                            .and_then(decimal_from_f64)
                    })
                    .map_err(|_| AmountError::NotANumber)?
            }
            _ => return Err(AmountError::NotANumber),
        };
        Self::new(decimal)
    }

    /// Get the underlying decimal value.
    #[must_use]
    pub const fn as_decimal(&self) -> Decimal {
        self.0
    }
}

fn decimal_from_f64(f: f64) -> Result<Decimal, AmountError> {
    if !f.is_finite() {
        return Err(AmountError::NotANumber);
    }
    Decimal::from_f64(f).ok_or(AmountError::NotANumber)
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_declared_number() {
        let amount = Amount::from_declared(&json!(59.9)).unwrap();
        assert_eq!(amount.to_string(), "59.90");

        let amount = Amount::from_declared(&json!(12)).unwrap();
        assert_eq!(amount.as_decimal(), Decimal::from(12));
    }

    #[test]
    fn test_from_declared_numeric_string() {
        let amount = Amount::from_declared(&json!("  19.99 ")).unwrap();
        assert_eq!(amount.to_string(), "19.99");
    }

    #[test]
    fn test_from_declared_zero_is_allowed() {
        assert_eq!(Amount::from_declared(&json!(0)).unwrap(), Amount::ZERO);
    }

    #[test]
    fn test_from_declared_rejects_negative() {
        assert_eq!(
            Amount::from_declared(&json!(-0.01)),
            Err(AmountError::Negative)
        );
    }

    #[test]
    fn test_max_is_largest_storable_total() {
        assert_eq!(Amount::MAX.to_string(), "9999999999.99");
        assert_eq!(
            Amount::from_declared(&json!("9999999999.99")).unwrap(),
            Amount::MAX
        );
    }

    #[test]
    fn test_from_declared_rejects_totals_beyond_max() {
        assert_eq!(
            Amount::from_declared(&json!(1e12)),
            Err(AmountError::TooLarge)
        );
        assert_eq!(
            Amount::from_declared(&json!(10_000_000_000_i64)),
            Err(AmountError::TooLarge)
        );
        assert_eq!(
            Amount::from_declared(&json!("9999999999.999")),
            Err(AmountError::TooLarge)
        );
    }

    #[test]
    fn test_from_declared_rejects_non_numbers() {
        assert_eq!(
            Amount::from_declared(&json!("abc")),
            Err(AmountError::NotANumber)
        );
        assert_eq!(
            Amount::from_declared(&json!(null)),
            Err(AmountError::NotANumber)
        );
        assert_eq!(
            Amount::from_declared(&json!([1])),
            Err(AmountError::NotANumber)
        );
        assert_eq!(
            Amount::from_declared(&json!("NaN")),
            Err(AmountError::NotANumber)
        );
    }
}
