//! Where a reconciler reads and writes the server-side cart.

use std::future::Future;

use serde::Deserialize;
use thiserror::Error;

use cartwright_core::{CartLineInput, CartPayload, ProductId, Quantity, UserId};

use crate::db::Store;
use crate::models::CartItemView;
use crate::services::cart::{CartError, CartService};

/// Errors from a cart backend. The reconciler logs and drops them.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("cart error: {0}")]
    Cart(#[from] CartError),
}

/// Server-side cart operations used by the reconciler.
///
/// Every call answers with the cart as stored after the call.
pub trait CartBackend: Send + Sync + 'static {
    fn fetch(
        &self,
        user: UserId,
    ) -> impl Future<Output = Result<Vec<CartLineInput>, SyncError>> + Send;

    fn replace(
        &self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> impl Future<Output = Result<Vec<CartLineInput>, SyncError>> + Send;

    fn merge(
        &self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> impl Future<Output = Result<Vec<CartLineInput>, SyncError>> + Send;
}

/// Talks to the storefront's `/users/{id}/cart` endpoints.
#[derive(Debug, Clone)]
pub struct HttpCartBackend {
    client: reqwest::Client,
    base_url: String,
}

/// The part of a cart record the reconciler needs.
#[derive(Debug, Deserialize)]
struct SyncedLine {
    id: ProductId,
    qty: Quantity,
}

impl HttpCartBackend {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn cart_url(&self, user: UserId) -> String {
        format!("{}/users/{user}/cart", self.base_url)
    }

    async fn lines_from(response: reqwest::Response) -> Result<Vec<CartLineInput>, SyncError> {
        let lines: Vec<SyncedLine> = response.error_for_status()?.json().await?;
        Ok(lines
            .into_iter()
            .map(|l| CartLineInput::new(l.id, l.qty))
            .collect())
    }
}

impl CartBackend for HttpCartBackend {
    async fn fetch(&self, user: UserId) -> Result<Vec<CartLineInput>, SyncError> {
        let response = self.client.get(self.cart_url(user)).send().await?;
        Self::lines_from(response).await
    }

    async fn replace(
        &self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<Vec<CartLineInput>, SyncError> {
        let response = self
            .client
            .put(self.cart_url(user))
            .json(&CartPayload::from_lines(lines))
            .send()
            .await?;
        Self::lines_from(response).await
    }

    async fn merge(
        &self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<Vec<CartLineInput>, SyncError> {
        let response = self
            .client
            .post(format!("{}/merge", self.cart_url(user)))
            .json(&CartPayload::from_lines(lines))
            .send()
            .await?;
        Self::lines_from(response).await
    }
}

/// Calls the cart service directly, for clients running inside the server
/// process (and tests).
#[derive(Clone)]
pub struct StoreCartBackend<S> {
    carts: CartService<S>,
}

impl<S: Store> StoreCartBackend<S> {
    #[must_use]
    pub const fn new(carts: CartService<S>) -> Self {
        Self { carts }
    }
}

fn lines_of(items: &[CartItemView]) -> Vec<CartLineInput> {
    items.iter().map(CartItemView::line).collect()
}

impl<S: Store> CartBackend for StoreCartBackend<S> {
    async fn fetch(&self, user: UserId) -> Result<Vec<CartLineInput>, SyncError> {
        Ok(lines_of(&self.carts.get(user).await?))
    }

    async fn replace(
        &self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<Vec<CartLineInput>, SyncError> {
        let payload = CartPayload::from_lines(lines);
        Ok(lines_of(&self.carts.replace(user, &payload).await?))
    }

    async fn merge(
        &self,
        user: UserId,
        lines: &[CartLineInput],
    ) -> Result<Vec<CartLineInput>, SyncError> {
        let payload = CartPayload::from_lines(lines);
        Ok(lines_of(&self.carts.merge(user, &payload).await?))
    }
}
