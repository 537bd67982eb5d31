//! Cart store operations exposed to clients.
//!
//! Each call is its own transaction. Incoming lines are normalized (see
//! [`cartwright_core::cart`]) before any write, and writes answer with the cart
//! as stored afterwards.

use thiserror::Error;
use tracing::instrument;

use cartwright_core::{CartPayload, UserId};

use crate::db::{CartStore, RepositoryError, Store, Transaction, UserDirectory};
use crate::models::CartItemView;

/// Errors that can occur in cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    #[error("User not found")]
    UserNotFound,

    #[error("Product not found")]
    ProductNotFound,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Cart operations over a store.
#[derive(Clone)]
pub struct CartService<S> {
    store: S,
}

impl<S: Store> CartService<S> {
    #[must_use]
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    /// The user's cart in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UserNotFound` for an unknown user.
    #[instrument(skip_all, fields(user_id = %user))]
    pub async fn get(&self, user: UserId) -> Result<Vec<CartItemView>, CartError> {
        let mut tx = self.store.begin().await?;
        require_user(&mut tx, user).await?;
        Ok(tx.cart_lines(user).await?)
    }

    /// Make the stored cart exactly the payload's normalized lines.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UserNotFound` / `CartError::ProductNotFound` for
    /// unknown references; the stored cart is then unchanged.
    #[instrument(skip_all, fields(user_id = %user))]
    pub async fn replace(
        &self,
        user: UserId,
        payload: &CartPayload,
    ) -> Result<Vec<CartItemView>, CartError> {
        let lines = payload.normalize();
        let mut tx = self.store.begin().await?;
        require_user(&mut tx, user).await?;

        tx.replace_cart(user, &lines)
            .await
            .map_err(product_not_found)?;
        let cart = tx.cart_lines(user).await?;
        tx.commit().await?;

        tracing::debug!(lines = cart.len(), "Cart replaced");
        Ok(cart)
    }

    /// Add the payload's normalized lines to the stored cart.
    ///
    /// # Errors
    ///
    /// Same as [`CartService::replace`].
    #[instrument(skip_all, fields(user_id = %user))]
    pub async fn merge(
        &self,
        user: UserId,
        payload: &CartPayload,
    ) -> Result<Vec<CartItemView>, CartError> {
        let lines = payload.normalize();
        let mut tx = self.store.begin().await?;
        require_user(&mut tx, user).await?;

        tx.merge_cart(user, &lines)
            .await
            .map_err(product_not_found)?;
        let cart = tx.cart_lines(user).await?;
        tx.commit().await?;

        tracing::debug!(merged = lines.len(), lines = cart.len(), "Cart merged");
        Ok(cart)
    }

    /// Delete every line of the user's cart.
    ///
    /// # Errors
    ///
    /// Returns `CartError::UserNotFound` for an unknown user.
    #[instrument(skip_all, fields(user_id = %user))]
    pub async fn clear(&self, user: UserId) -> Result<u64, CartError> {
        let mut tx = self.store.begin().await?;
        require_user(&mut tx, user).await?;
        let removed = tx.clear_cart(user).await?;
        tx.commit().await?;
        Ok(removed)
    }
}

async fn require_user<T: UserDirectory>(tx: &mut T, user: UserId) -> Result<(), CartError> {
    if tx.hold_user(user).await? {
        Ok(())
    } else {
        Err(CartError::UserNotFound)
    }
}

fn product_not_found(e: RepositoryError) -> CartError {
    match e {
        RepositoryError::NotFound => CartError::ProductNotFound,
        other => CartError::Repository(other),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwright_core::{Email, ProductId};
    use rust_decimal::Decimal;
    use serde_json::json;

    use super::*;
    use crate::db::MemoryStore;
    use crate::models::{NewProduct, NewUser, Role};

    async fn fixture() -> (CartService<MemoryStore>, MemoryStore, UserId, ProductId, ProductId) {
        let store = MemoryStore::new();
        let user = store
            .add_user(NewUser {
                email: Email::parse("grace@example.com").unwrap(),
                name: "Grace".to_owned(),
                role: Role::Customer,
            })
            .await
            .unwrap();
        let a = store
            .add_product(NewProduct::basic("A", Decimal::ONE, 5))
            .await;
        let b = store
            .add_product(NewProduct::basic("B", Decimal::TWO, 5))
            .await;
        (CartService::new(store.clone()), store, user.id, a.id, b.id)
    }

    fn payload(lines: serde_json::Value) -> CartPayload {
        CartPayload(json!({ "items": lines }))
    }

    #[tokio::test]
    async fn test_replace_is_idempotent_and_sums_duplicates() {
        let (carts, store, user, a, b) = fixture().await;
        let body = payload(json!([
            {"productId": a.as_i32(), "qty": 1},
            {"productId": b.as_i32(), "qty": 2},
            {"productId": a.as_i32(), "qty": 2},
        ]));

        let first = carts.replace(user, &body).await.unwrap();
        let second = carts.replace(user, &body).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(store.cart(user).await, vec![(a, 3), (b, 2)]);
    }

    #[tokio::test]
    async fn test_replace_removes_missing_lines() {
        let (carts, store, user, a, b) = fixture().await;
        carts
            .replace(user, &payload(json!([{"productId": a.as_i32(), "qty": 1}, {"productId": b.as_i32(), "qty": 1}])))
            .await
            .unwrap();

        let cart = carts
            .replace(user, &payload(json!([{"productId": b.as_i32(), "qty": 4}])))
            .await
            .unwrap();

        assert_eq!(cart.len(), 1);
        assert_eq!(cart[0].product.id, b);
        assert_eq!(cart[0].qty.get(), 4);
        assert_eq!(store.cart(user).await, vec![(b, 4)]);
    }

    #[tokio::test]
    async fn test_merge_is_additive() {
        let (carts, _, user, a, _) = fixture().await;
        carts
            .merge(user, &payload(json!([{"productId": a.as_i32(), "qty": 2}])))
            .await
            .unwrap();
        let cart = carts
            .merge(user, &payload(json!([{"productId": a.as_i32(), "qty": 3}])))
            .await
            .unwrap();

        assert_eq!(cart[0].qty.get(), 5);
    }

    #[tokio::test]
    async fn test_merge_of_noise_leaves_cart_empty() {
        let (carts, _, user, _, _) = fixture().await;
        let cart = carts
            .merge(
                user,
                &payload(json!([{"productId": 5, "qty": -2}, {"productId": "x", "qty": 3}])),
            )
            .await
            .unwrap();
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_product_leaves_cart_unchanged() {
        let (carts, store, user, a, _) = fixture().await;
        carts
            .replace(user, &payload(json!([{"productId": a.as_i32(), "qty": 1}])))
            .await
            .unwrap();

        let err = carts
            .replace(user, &payload(json!([{"productId": 404, "qty": 1}])))
            .await
            .unwrap_err();

        assert!(matches!(err, CartError::ProductNotFound));
        assert_eq!(store.cart(user).await, vec![(a, 1)]);
    }

    #[tokio::test]
    async fn test_unknown_user() {
        let (carts, _, _, _, _) = fixture().await;
        let err = carts.get(UserId::new(77)).await.unwrap_err();
        assert!(matches!(err, CartError::UserNotFound));
    }

    #[tokio::test]
    async fn test_clear() {
        let (carts, _, user, a, b) = fixture().await;
        carts
            .replace(user, &payload(json!([{"id": a.as_i32(), "qty": 1}, {"id": b.as_i32(), "quantity": 1}])))
            .await
            .unwrap();

        assert_eq!(carts.clear(user).await.unwrap(), 2);
        assert!(carts.get(user).await.unwrap().is_empty());
    }
}
