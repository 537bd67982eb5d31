//! Integration tests for Cartwright.
//!
//! # Running Tests
//!
//! ```bash
//! # HTTP tests against the router over an in-memory store
//! cargo test -p cartwright-integration-tests
//!
//! # PostgreSQL tests (needs a migrated database)
//! DATABASE_URL=postgres://localhost/cartwright_test \
//!     cargo test -p cartwright-integration-tests -- --ignored
//! ```
//!
//! # Test Categories
//!
//! - `checkout_api` - `POST /checkout` end to end
//! - `cart_api` - `/users/{id}/cart` endpoints and order history
//! - `postgres_store` - `PgStore` against a real database

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use cartwright_core::{Email, ProductId, UserId};
use cartwright_storefront::db::MemoryStore;
use cartwright_storefront::models::{NewProduct, NewUser, Role};
use cartwright_storefront::routes;
use cartwright_storefront::services::payment::{AlwaysApprove, PaymentGate};
use cartwright_storefront::state::AppState;

/// The storefront router over a fresh in-memory store.
pub struct TestApp {
    pub store: MemoryStore,
    router: Router,
}

/// Status and decoded body of a test request.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    /// App whose payment gate approves everything.
    #[must_use]
    pub fn new() -> Self {
        Self::with_gate(Arc::new(AlwaysApprove))
    }

    /// App with a specific payment gate.
    #[must_use]
    pub fn with_gate(gate: Arc<dyn PaymentGate>) -> Self {
        let store = MemoryStore::new();
        let router = routes::app(AppState::new(store.clone(), gate));
        Self { store, router }
    }

    /// Send a request with an optional JSON body.
    ///
    /// # Panics
    ///
    /// Panics if the request cannot be built or the body cannot be read.
    pub async fn request(&self, method: Method, uri: &str, body: Option<&Value>) -> TestResponse {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("Failed to build request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("Failed to read response body");
        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        TestResponse { status, body }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: &Value) -> TestResponse {
        self.request(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None).await
    }

    /// Create a customer account.
    ///
    /// # Panics
    ///
    /// Panics if the email is invalid or already taken.
    pub async fn customer(&self, email: &str) -> UserId {
        self.store
            .add_user(NewUser {
                email: Email::parse(email).expect("valid email"),
                name: email.split('@').next().unwrap_or(email).to_owned(),
                role: Role::Customer,
            })
            .await
            .expect("Failed to create customer")
            .id
    }

    /// Create a product priced in whole units.
    pub async fn product(&self, title: &str, price: i64, stock: i32) -> ProductId {
        self.store
            .add_product(NewProduct::basic(title, Decimal::from(price), stock))
            .await
            .id
    }
}
