//! Cart views and the client-side cart reducer.

use serde::{Deserialize, Serialize};

use cartwright_core::{CartLineInput, ProductId, Quantity};

use super::Product;

/// One stored cart line as returned to clients: the product's fields plus `qty`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItemView {
    #[serde(flatten)]
    pub product: Product,
    pub qty: Quantity,
}

impl CartItemView {
    #[must_use]
    pub const fn line(&self) -> CartLineInput {
        CartLineInput::new(self.product.id, self.qty)
    }
}

/// A locally held, optimistically edited cart.
///
/// Lines keep insertion order and never carry a zero quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalCart {
    lines: Vec<CartLineInput>,
}

impl LocalCart {
    /// Add one unit, appending the product if it is not in the cart yet.
    pub fn add(&mut self, product: ProductId) {
        match self.lines.iter_mut().find(|l| l.product_id == product) {
            Some(line) => line.quantity = line.quantity.saturating_add(Quantity::ONE),
            None => self.lines.push(CartLineInput::new(product, Quantity::ONE)),
        }
    }

    /// Remove one unit, dropping the line when it would reach zero.
    ///
    /// Returns `false` if the product was not in the cart.
    pub fn remove(&mut self, product: ProductId) -> bool {
        let Some(i) = self.lines.iter().position(|l| l.product_id == product) else {
            return false;
        };
        let Some(line) = self.lines.get_mut(i) else {
            return false;
        };
        match line.quantity.decremented() {
            Some(q) => line.quantity = q,
            None => {
                self.lines.remove(i);
            }
        }
        true
    }

    pub fn empty(&mut self) {
        self.lines.clear();
    }

    /// Replace the whole cart (hydration).
    pub fn set(&mut self, lines: Vec<CartLineInput>) {
        self.lines = lines;
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLineInput] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total units across all lines.
    #[must_use]
    pub fn units(&self) -> i64 {
        self.lines.iter().map(|l| i64::from(l.quantity.get())).sum()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn p(id: i32) -> ProductId {
        ProductId::new(id)
    }

    #[test]
    fn test_add_appends_then_increments() {
        let mut cart = LocalCart::default();
        cart.add(p(2));
        cart.add(p(1));
        cart.add(p(2));

        let lines: Vec<_> = cart
            .lines()
            .iter()
            .map(|l| (l.product_id.as_i32(), l.quantity.get()))
            .collect();
        assert_eq!(lines, vec![(2, 2), (1, 1)]);
        assert_eq!(cart.units(), 3);
    }

    #[test]
    fn test_remove_drops_line_at_one() {
        let mut cart = LocalCart::default();
        cart.add(p(1));
        cart.add(p(1));

        assert!(cart.remove(p(1)));
        assert_eq!(cart.lines().first().unwrap().quantity.get(), 1);
        assert!(cart.remove(p(1)));
        assert!(cart.is_empty());
        assert!(!cart.remove(p(1)));
    }

    #[test]
    fn test_set_and_empty() {
        let mut cart = LocalCart::default();
        cart.set(vec![CartLineInput::new(p(9), Quantity::new(4).unwrap())]);
        assert_eq!(cart.units(), 4);
        cart.empty();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_view_serializes_flat() {
        let view = CartItemView {
            product: crate::models::product::tests::sample_product(3),
            qty: Quantity::new(2).unwrap(),
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["qty"], 2);
        assert_eq!(json["title"], "Product 3");
    }
}
