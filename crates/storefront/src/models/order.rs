//! Order domain types.
//!
//! Orders are immutable once created: the total is whatever was recorded at
//! placement time and lines reference products rather than copying them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwright_core::{Amount, CartLineInput, OrderId, OrderLineId, ProductId, Quantity, UserId};

use super::Product;

/// An order about to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub user_id: UserId,
    pub total: Amount,
    pub lines: Vec<CartLineInput>,
}

/// A persisted order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Amount,
    pub created_at: DateTime<Utc>,
    pub lines: Vec<OrderLine>,
}

/// A persisted order line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: OrderLineId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
}

/// An order line joined with the product's current record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItemView {
    pub id: OrderLineId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub product: Product,
}

/// An order as shown in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: OrderId,
    pub user_id: UserId,
    pub total: Amount,
    pub created_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub total: Amount,
}

impl From<&Order> for PlacedOrder {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            total: order.total,
        }
    }
}
