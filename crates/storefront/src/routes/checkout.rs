//! Checkout route handler.

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Serialize;
use tracing::instrument;

use cartwright_core::OrderId;

use crate::db::Store;
use crate::error::Result;
use crate::services::checkout::CheckoutSubmission;
use crate::state::AppState;

/// Body of a successful checkout.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderPlacedResponse {
    pub success: bool,
    pub message: &'static str,
    pub order_id: OrderId,
    pub total: String,
}

/// Place an order for the submitted cart.
///
/// Responds 201 on success, 400 for validation and stock problems and 402
/// when the card is declined.
#[instrument(skip_all)]
pub async fn place<S: Store>(
    State(state): State<AppState<S>>,
    body: std::result::Result<Json<CheckoutSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<OrderPlacedResponse>)> {
    let Json(submission) = body.map_err(|e| super::bad_body(&e))?;
    let order = submission.validate()?;
    let placed = state.checkout().place_order(order).await?;

    Ok((
        StatusCode::CREATED,
        Json(OrderPlacedResponse {
            success: true,
            message: "Order placed successfully",
            order_id: placed.order_id,
            total: placed.total.to_string(),
        }),
    ))
}

