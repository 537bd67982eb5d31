//! HTTP route handlers for the storefront API.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                       - Liveness
//! GET    /health/ready                 - Readiness (store round-trip)
//!
//! # Checkout
//! POST   /checkout                     - Place an order
//!
//! # Cart (per user)
//! GET    /users/{id}/cart              - Stored cart
//! PUT    /users/{id}/cart              - Replace stored cart
//! DELETE /users/{id}/cart              - Clear stored cart
//! POST   /users/{id}/cart/merge        - Merge lines into stored cart
//! GET    /users/{id}/orders            - Order history, newest first
//!
//! # Inventory
//! PATCH  /admin/products/{id}          - Set absolute stock level
//! POST   /admin/products/{id}/restock  - Return units to stock
//! ```
//!
//! Every error body is `{ "success": false, "error": "..." }` (see
//! [`crate::error::AppError`]).

pub mod admin;
pub mod cart;
pub mod checkout;
pub mod orders;

use axum::{
    Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    routing::{get, patch, post},
};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the per-user routes router.
pub fn user_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route(
            "/{id}/cart",
            get(cart::show::<S>)
                .put(cart::replace::<S>)
                .delete(cart::clear::<S>),
        )
        .route("/{id}/cart/merge", post(cart::merge::<S>))
        .route("/{id}/orders", get(orders::index::<S>))
}

/// Create the inventory admin routes router.
pub fn admin_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/products/{id}", patch(admin::set_stock::<S>))
        .route("/products/{id}/restock", post(admin::restock::<S>))
}

/// Create all routes for the storefront.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness::<S>))
        .route("/checkout", post(checkout::place::<S>))
        .nest("/users", user_routes())
        .nest("/admin", admin_routes())
}

/// Build the complete application: routes, state and middleware.
pub fn app<S: Store>(state: AppState<S>) -> Router {
    routes()
        .layer(middleware::from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &Span| {
                        span.record("status", response.status().as_u16());
                        span.record(
                            "latency_ms",
                            u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                        );
                        DefaultOnResponse::default().on_response(response, latency, span);
                    },
                ),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the store is not reachable.
async fn readiness<S: Store>(State(state): State<AppState<S>>) -> StatusCode {
    match state.store().ping().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

/// Turn a body that failed to parse into a 400.
fn bad_body(rejection: &JsonRejection) -> AppError {
    AppError::BadRequest(rejection.body_text())
}
