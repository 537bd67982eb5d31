//! Cart route handlers.
//!
//! Carts are addressed by user id. Write bodies are normalized before they
//! reach the store (see [`cartwright_core::cart`]); `PUT` and merge respond
//! with the cart as stored afterwards.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use serde_json::{Value, json};
use tracing::instrument;

use cartwright_core::{CartPayload, UserId};

use crate::db::Store;
use crate::error::{AppError, Result};
use crate::models::CartItemView;
use crate::state::AppState;

/// Parse a `{id}` path segment as a user id.
///
/// Anything that is not a positive integer is a malformed request.
pub(crate) fn user_id(raw: &str) -> Result<UserId> {
    raw.parse()
        .map_err(|_| AppError::BadRequest("Invalid user id".to_string()))
}

/// Get the user's stored cart.
#[instrument(skip(state))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<CartItemView>>> {
    let user = user_id(&id)?;
    Ok(Json(state.carts().get(user).await?))
}

/// Replace the user's stored cart with the body's lines.
#[instrument(skip(state, body))]
pub async fn replace<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<CartPayload>, JsonRejection>,
) -> Result<Json<Vec<CartItemView>>> {
    let user = user_id(&id)?;
    let Json(payload) = body.map_err(|e| super::bad_body(&e))?;
    Ok(Json(state.carts().replace(user, &payload).await?))
}

/// Add the body's lines to the user's stored cart.
#[instrument(skip(state, body))]
pub async fn merge<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
    body: std::result::Result<Json<CartPayload>, JsonRejection>,
) -> Result<Json<Vec<CartItemView>>> {
    let user = user_id(&id)?;
    let Json(payload) = body.map_err(|e| super::bad_body(&e))?;
    Ok(Json(state.carts().merge(user, &payload).await?))
}

/// Delete every line of the user's stored cart.
#[instrument(skip(state))]
pub async fn clear<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<String>,
) -> Result<Json<Value>> {
    let user = user_id(&id)?;
    let removed = state.carts().clear(user).await?;
    tracing::debug!(removed, "Cart cleared");
    Ok(Json(json!({ "success": true })))
}
