//! Inventory administration handlers.
//!
//! These are the only writers of stock outside checkout.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use cartwright_core::{ProductId, Quantity};

use crate::db::{RepositoryError, StockLedger, Store, Transaction};
use crate::error::{AppError, Result};
use crate::state::AppState;

/// Body of `PATCH /admin/products/{id}`.
#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub stock: i64,
}

/// Body of `POST /admin/products/{id}/restock`.
#[derive(Debug, Deserialize)]
pub struct RestockRequest {
    #[serde(alias = "quantity")]
    pub qty: i64,
}

/// Stock level after an administrative write.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StockLevelResponse {
    pub success: bool,
    pub product_id: ProductId,
    pub stock: i32,
}

fn product_id(raw: &str) -> Result<ProductId> {
    raw.parse()
        .map_err(|_| AppError::NotFound("Product not found".to_string()))
}

fn product_not_found(e: RepositoryError) -> AppError {
    match e {
        RepositoryError::NotFound => AppError::NotFound("Product not found".to_string()),
        other => AppError::Database(other),
    }
}

/// Set a product's stock to an absolute level.
#[instrument(skip(state, body))]
pub async fn set_stock<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<SetStockRequest>, JsonRejection>,
) -> Result<Json<StockLevelResponse>> {
    let product = product_id(&id)?;
    let Json(req) = body.map_err(|e| super::bad_body(&e))?;
    let level = i32::try_from(req.stock)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .ok_or_else(|| {
            AppError::BadRequest("Stock must be a non-negative integer".to_string())
        })?;

    let mut tx = state.store().begin().await?;
    let stock = tx
        .set_level(product, level)
        .await
        .map_err(product_not_found)?;
    tx.commit().await?;

    tracing::info!(product_id = %product, stock, "Stock level set");
    Ok(Json(StockLevelResponse {
        success: true,
        product_id: product,
        stock,
    }))
}

/// Return units of a product to stock.
#[instrument(skip(state, body))]
pub async fn restock<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<RestockRequest>, JsonRejection>,
) -> Result<Json<StockLevelResponse>> {
    let product = product_id(&id)?;
    let Json(req) = body.map_err(|e| super::bad_body(&e))?;
    let quantity = Quantity::new(req.qty).map_err(|e| AppError::BadRequest(e.to_string()))?;

    let mut tx = state.store().begin().await?;
    let stock = tx
        .increment(product, quantity)
        .await
        .map_err(product_not_found)?;
    tx.commit().await?;

    tracing::info!(product_id = %product, added = quantity.get(), stock, "Product restocked");
    Ok(Json(StockLevelResponse {
        success: true,
        product_id: product,
        stock,
    }))
}
