//! HTTP surface over the rate limiter.
//!
//! Exposes a single `GET /take?endpoint=<resource>` route returning
//! `{"status": "accepted"|"rejected", "remaining_tokens": N}`.

mod handlers;
mod server;

use std::sync::Arc;

use axum::routing::get;
use axum::Router;

use crate::ratelimit::RateLimiterBackend;

pub use handlers::{take_token, TakeStatus, TakeTokenParams, TakeTokenResponse, MISSING_ENDPOINT};
pub use server::HttpServer;

/// Build the service router around a shared rate limiter.
pub fn build_router<R: RateLimiterBackend + 'static>(rate_limiter: Arc<R>) -> Router {
    Router::new()
        .route("/take", get(take_token::<R>))
        .with_state(rate_limiter)
}
