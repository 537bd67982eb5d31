//! Client-supplied cart lines and their normalization.
//!
//! Carts arrive from browsers and sync clients that may hold duplicate lines,
//! lines removed in the UI before the request landed, or loosely typed values
//! (`"3"` instead of `3`). Before any cart write, lines are normalized:
//!
//! - lines are keyed by product id; duplicates are summed
//! - lines with a missing, non-integer or non-positive product id are dropped
//! - lines with a missing, non-integer or non-positive quantity are dropped
//! - the first occurrence of a product fixes its position
//!
//! Dropped lines are noise, not errors.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{ProductId, Quantity};

/// A validated, deduplicated cart line ready to be written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineInput {
    /// Product being purchased.
    #[serde(rename = "productId")]
    pub product_id: ProductId,
    /// Units of the product.
    #[serde(rename = "qty", alias = "quantity")]
    pub quantity: Quantity,
}

impl CartLineInput {
    /// Create a cart line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// One loosely typed line as posted by a client.
///
/// The product may be named `productId` or `id`; the quantity `qty` or
/// `quantity`. Values may be numbers or numeric strings.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawCartLine {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

impl RawCartLine {
    /// Read a raw line from an arbitrary JSON value.
    ///
    /// Non-object values yield an empty line, which normalization drops.
    #[must_use]
    pub fn from_value(value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self::default();
        };

        let first_present = |keys: &[&str]| {
            keys.iter()
                .filter_map(|k| obj.get(*k))
                .find(|v| !v.is_null())
                .and_then(as_integer)
        };

        Self {
            product_id: first_present(&["productId", "id"]),
            quantity: first_present(&["qty", "quantity"]),
        }
    }

    /// Validate this line, returning `None` if it should be dropped.
    #[must_use]
    pub fn validate(&self) -> Option<CartLineInput> {
        let product_id = ProductId::from_positive(self.product_id?)?;
        let quantity = Quantity::new(self.quantity?).ok()?;
        Some(CartLineInput::new(product_id, quantity))
    }
}

/// The body of a cart write request.
///
/// Accepts `{ "items": [...] }`, `{ "cartItems": [...] }` or a bare array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CartPayload(pub Value);

impl CartPayload {
    /// Wrap already-validated lines as an `{ "items": [...] }` body.
    #[must_use]
    pub fn from_lines(lines: &[CartLineInput]) -> Self {
        Self(serde_json::json!({ "items": lines }))
    }

    /// The raw line values carried by this payload.
    #[must_use]
    pub fn raw_lines(&self) -> &[Value] {
        let lines = match &self.0 {
            Value::Array(items) => Some(items),
            Value::Object(obj) => ["items", "cartItems"]
                .iter()
                .filter_map(|k| obj.get(*k))
                .find_map(Value::as_array),
            _ => None,
        };
        lines.map(Vec::as_slice).unwrap_or_default()
    }

    /// Normalize the payload's lines.
    #[must_use]
    pub fn normalize(&self) -> Vec<CartLineInput> {
        normalize_cart_lines(self.raw_lines())
    }
}

/// Normalize raw client lines (see module docs for the rules).
#[must_use]
pub fn normalize_cart_lines(raw: &[Value]) -> Vec<CartLineInput> {
    let mut lines: Vec<CartLineInput> = Vec::with_capacity(raw.len());
    let mut positions: HashMap<ProductId, usize> = HashMap::new();

    for line in raw.iter().map(RawCartLine::from_value) {
        let Some(line) = line.validate() else {
            continue;
        };

        if let Some(existing) = positions
            .get(&line.product_id)
            .and_then(|&i| lines.get_mut(i))
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            positions.insert(line.product_id, lines.len());
            lines.push(line);
        }
    }

    lines
}

/// Coerce a JSON value to an integer the way a lenient web client would.
///
/// Integral numbers (`3`, `3.0`) and numeric strings (`"3"`) are accepted;
/// fractions, booleans, arrays and objects are not.
#[must_use]
pub fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(integral_f64)),
        Value::String(s) => {
            let trimmed = s.trim();
            trimmed
                .parse::<i64>()
                .ok()
                .or_else(|| trimmed.parse::<f64>().ok().and_then(integral_f64))
        }
        _ => None,
    }
}

#[allow(clippy::cast_possible_truncation)] // Range is checked before the cast
fn integral_f64(f: f64) -> Option<i64> {
    let in_range = f.is_finite() && f.fract() == 0.0 && f.abs() < 9.0e15;
    in_range.then(|| f as i64)
}
