//! Product domain types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cartwright_core::ProductId;

/// Aggregate customer rating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub rate: f64,
    pub count: i32,
}

/// A catalog product with its live stock level.
///
/// `stock` is only ever changed through the stock ledger; everything else is
/// owned by catalog management.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub description: String,
    pub category: String,
    pub image: Option<String>,
    pub rating: Rating,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a catalog product (seeding).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub title: String,
    pub price: Decimal,
    #[serde(default)]
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub rating: Rating,
    pub stock: i32,
}

impl NewProduct {
    /// A product with only the fields checkout cares about filled in.
    #[must_use]
    pub fn basic(title: impl Into<String>, price: Decimal, stock: i32) -> Self {
        Self {
            title: title.into(),
            price,
            description: String::new(),
            category: "general".to_owned(),
            image: None,
            rating: Rating::default(),
            stock,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_product(id: i32) -> Product {
        Product {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::new(1999, 2),
            description: String::new(),
            category: "general".to_owned(),
            image: None,
            rating: Rating::default(),
            stock: 5,
            created_at: DateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn test_product_uses_camel_case() {
        let json = serde_json::to_value(sample_product(1)).unwrap();
        assert!(json.get("createdAt").is_some());
        assert_eq!(json["price"], "19.99");
    }

    #[test]
    fn test_new_product_defaults() {
        let product: NewProduct = serde_json::from_str(
            r#"{"title":"Mug","price":"9.50","category":"kitchen","stock":3}"#,
        )
        .unwrap();
        assert_eq!(product.description, "");
        assert_eq!(product.rating, Rating::default());
        assert_eq!(product.price, Decimal::new(950, 2));
    }
}
