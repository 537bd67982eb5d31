//! Cart sync command.
//!
//! Drives the cart reconciler against a running storefront, the way a
//! browser session would: optional guest edits, login (merge + hydrate),
//! edits, then a final flush.
//!
//! # Usage
//!
//! ```bash
//! # Log user 3 in, add product 5 twice and drop one unit of product 7
//! cw-cli cart sync --user 3 --add 5 --add 5 --remove 7
//!
//! # Fill a guest cart first; it is merged into the user's cart on login
//! cw-cli cart sync --user 3 --guest-add 5 --guest-add 9
//! ```
//!
//! # Environment Variables
//!
//! - `CART_SYNC_BASE_URL` - Storefront URL (default: <http://127.0.0.1:5000>)
//! - `CART_SYNC_DEBOUNCE_MS` - Debounce delay (default: 400)

use cartwright_core::{CartLineInput, ProductId, UserId};
use cartwright_storefront::config::{CartSyncConfig, ConfigError};
use cartwright_storefront::services::reconciler::{CartReconciler, HttpCartBackend};

/// Edits to replay through the reconciler.
#[derive(Debug, Default)]
pub struct SyncPlan {
    pub user: Option<UserId>,
    pub guest_add: Vec<ProductId>,
    pub add: Vec<ProductId>,
    pub remove: Vec<ProductId>,
}

/// Replay `plan` and return the local cart once everything is written back.
///
/// # Errors
///
/// Returns `ConfigError` for invalid sync settings. Backend failures are
/// logged by the reconciler and do not fail the command.
pub async fn sync(plan: SyncPlan) -> Result<Vec<CartLineInput>, ConfigError> {
    let config = CartSyncConfig::from_env()?;
    tracing::info!(base_url = %config.base_url, debounce_ms = config.debounce.as_millis(), "Starting cart sync");

    let reconciler = CartReconciler::new(HttpCartBackend::new(config.base_url), config.debounce);

    for product in &plan.guest_add {
        reconciler.add(*product);
    }
    if let Some(user) = plan.user {
        reconciler.login(user).await;
        if !reconciler.is_hydrated() {
            tracing::warn!(user_id = %user, "Cart did not hydrate");
        }
    }
    for product in &plan.add {
        reconciler.add(*product);
    }
    for product in &plan.remove {
        if !reconciler.remove(*product) {
            tracing::warn!(product_id = %product, "Product not in cart");
        }
    }

    reconciler.flush().await;
    let lines = reconciler.lines();
    reconciler.shutdown().await;
    Ok(lines)
}
