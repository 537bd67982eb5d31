//! Order history route handler.

use axum::{
    Json,
    extract::{Path, State},
};
use tracing::instrument;

use crate::db::{OrderBook, Store, UserDirectory};
use crate::error::{AppError, Result};
use crate::models::OrderView;
use crate::state::AppState;

/// A user's orders, newest first.
#[instrument(skip(state))]
pub async fn index<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<OrderView>>> {
    let user = super::cart::user_id(&id)?;

    let mut tx = state.store().begin().await?;
    if tx.find_user(user).await?.is_none() {
        return Err(AppError::NotFound("User not found".to_string()));
    }
    Ok(Json(tx.orders_for_user(user).await?))
}
