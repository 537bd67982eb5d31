//! Stock administration commands.
//!
//! # Usage
//!
//! ```bash
//! # Set an absolute stock level
//! cw-cli stock set 12 40
//!
//! # Return 5 units of product 12 to stock
//! cw-cli stock restock 12 5
//! ```

use cartwright_core::{ProductId, Quantity};
use cartwright_storefront::db::{PgStore, RepositoryError, StockLedger, Store, Transaction};

use super::{CommandError, connect};

fn unknown_product(product: ProductId) -> impl FnOnce(RepositoryError) -> CommandError {
    move |e| match e {
        RepositoryError::NotFound => CommandError::Invalid(format!("Product {product} not found")),
        other => other.into(),
    }
}

/// Set a product's stock to `level`.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for an unknown product or a level above
/// the storable range.
pub async fn set(product: ProductId, level: u32) -> Result<(), CommandError> {
    if i32::try_from(level).is_err() {
        return Err(CommandError::Invalid(format!("stock level {level} is too large")));
    }

    let store = PgStore::new(connect().await?);
    let mut tx = store.begin().await?;
    let stock = tx
        .set_level(product, level)
        .await
        .map_err(unknown_product(product))?;
    tx.commit().await?;

    tracing::info!(product_id = %product, stock, "Stock level set");
    Ok(())
}

/// Add `quantity` units of a product to stock.
///
/// # Errors
///
/// Returns `CommandError::Invalid` for an unknown product or a non-positive
/// quantity.
pub async fn restock(product: ProductId, quantity: i64) -> Result<(), CommandError> {
    let quantity = Quantity::new(quantity).map_err(|e| CommandError::Invalid(e.to_string()))?;

    let store = PgStore::new(connect().await?);
    let mut tx = store.begin().await?;
    let stock = tx
        .increment(product, quantity)
        .await
        .map_err(unknown_product(product))?;
    tx.commit().await?;

    tracing::info!(product_id = %product, added = quantity.get(), stock, "Product restocked");
    Ok(())
}
