//! Request handlers for the admission endpoint.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, instrument, warn, Span};

use crate::ratelimit::RateLimiterBackend;

/// Error message returned when the `endpoint` parameter is absent.
pub const MISSING_ENDPOINT: &str = "Missing a required query parameter: endpoint";

/// Query parameters accepted by `GET /take`.
#[derive(Debug, Deserialize)]
pub struct TakeTokenParams {
    /// Resource to check, typically a route template
    pub endpoint: Option<String>,
}

/// Outcome reported to the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TakeStatus {
    Accepted,
    Rejected,
}

/// Body of a successful `GET /take` response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TakeTokenResponse {
    pub status: TakeStatus,
    pub remaining_tokens: u64,
}

/// Take a token for the requested endpoint.
///
/// Responds 200 whether or not the request is admitted; rejections always
/// report zero remaining tokens. A missing or empty `endpoint` is a 400.
#[instrument(skip_all, fields(endpoint = tracing::field::Empty))]
pub async fn take_token<R: RateLimiterBackend + 'static>(
    State(rate_limiter): State<Arc<R>>,
    Query(params): Query<TakeTokenParams>,
) -> Response {
    let Some(endpoint) = params.endpoint.filter(|e| !e.is_empty()) else {
        warn!("Received take request without an endpoint");
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": MISSING_ENDPOINT })),
        )
            .into_response();
    };
    Span::current().record("endpoint", endpoint.as_str());

    let admission = rate_limiter.allow_connection(&endpoint);

    let response = if admission.admitted {
        debug!(
            remaining_tokens = admission.remaining_tokens,
            "Request accepted"
        );
        TakeTokenResponse {
            status: TakeStatus::Accepted,
            remaining_tokens: admission.remaining_tokens,
        }
    } else {
        debug!("Request rejected, rate limit exceeded");
        TakeTokenResponse {
            status: TakeStatus::Rejected,
            remaining_tokens: 0,
        }
    };

    (StatusCode::OK, Json(response)).into_response()
}
