//! HTTP middleware for the storefront API.
//!
//! # Middleware Order (outermost first)
//!
//! 1. Sentry layers (hub per request, transaction capture) - added in `main`
//! 2. `TraceLayer` (`http_request` span with method, uri, status, latency)
//! 3. Request ID (fills the span's `request_id`, tags Sentry, echoes header)

pub mod request_id;

pub use request_id::{REQUEST_ID_HEADER, request_id_middleware};
