//! Order book: append-only order history.

use std::future::Future;

use cartwright_core::UserId;

use super::RepositoryError;
use crate::models::{NewOrder, Order, OrderView};

/// Orders and their lines. Rows are written once and never updated.
pub trait OrderBook {
    /// Insert an order with one line per entry of `order.lines`, in order.
    fn insert_order(
        &mut self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    /// A user's orders, newest first, with their lines and products.
    fn orders_for_user(
        &mut self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<OrderView>, RepositoryError>> + Send;
}
