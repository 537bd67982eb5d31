//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::Store;
use crate::services::cart::CartService;
use crate::services::checkout::CheckoutService;
use crate::services::payment::PaymentGate;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to the
/// store and the services built on top of it.
#[derive(Clone)]
pub struct AppState<S> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
    checkout: CheckoutService<S>,
    carts: CartService<S>,
}

impl<S: Store> AppState<S> {
    /// Create a new application state.
    ///
    /// # Arguments
    ///
    /// * `store` - Backing store (`PgStore` in production)
    /// * `gate` - Payment gate consulted by checkout
    #[must_use]
    pub fn new(store: S, gate: Arc<dyn PaymentGate>) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                checkout: CheckoutService::new(store.clone(), gate),
                carts: CartService::new(store.clone()),
                store,
            }),
        }
    }

    /// Get a reference to the backing store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }

    /// Get a reference to the order transaction engine.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService<S> {
        &self.inner.checkout
    }

    /// Get a reference to the cart service.
    #[must_use]
    pub fn carts(&self) -> &CartService<S> {
        &self.inner.carts
    }
}
