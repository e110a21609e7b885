//! API key authentication gate.
//!
//! Every request must carry the configured key in the `X-API-Key` header.
//! The check runs before routing, holds no state, and answers failures with
//! `401 {"error": "Unauthorized"}` without calling the wrapped handler.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::{Instrument, debug, info, info_span, warn};
use uuid::Uuid;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Holds the expected API key.
#[derive(Clone)]
pub struct ApiKeyGate {
    expected: Arc<str>,
}

impl ApiKeyGate {
    /// Create a gate accepting `api_key`.
    pub fn new(api_key: impl AsRef<str>) -> Self {
        Self {
            expected: Arc::from(api_key.as_ref()),
        }
    }

    /// Whether `headers` carry the expected key.
    ///
    /// Missing, empty and non-UTF-8 values are rejected.
    pub fn authorize(&self, headers: &HeaderMap) -> bool {
        let Some(provided) = headers.get(API_KEY_HEADER) else {
            return false;
        };
        let Ok(provided) = provided.to_str() else {
            return false;
        };
        !provided.is_empty() && constant_time_eq(provided, &self.expected)
    }
}

impl std::fmt::Debug for ApiKeyGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiKeyGate").finish_non_exhaustive()
    }
}

/// Compare two strings without returning early on the first mismatch.
///
/// Runs in time proportional to the longer input; a length difference is
/// folded into the result instead of short-circuiting.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let a = a.as_bytes();
    let b = b.as_bytes();
    let mut diff = u64::try_from(a.len() ^ b.len()).unwrap_or(u64::MAX);
    for i in 0..a.len().max(b.len()) {
        let x = a.get(i).copied().unwrap_or(0);
        let y = b.get(i).copied().unwrap_or(0);
        diff |= u64::from(x ^ y);
    }
    diff == 0
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

/// Axum middleware enforcing the API key.
///
/// Install with `axum::middleware::from_fn_with_state(gate, require_api_key)`.
pub async fn require_api_key(
    State(gate): State<ApiKeyGate>,
    request: Request,
    next: Next,
) -> Response {
    let request_id = Uuid::new_v4();
    let span = info_span!("request", id = %request_id);

    async move {
        info!("{} {}", request.method(), request.uri().path());

        if !gate.authorize(request.headers()) {
            warn!("Unauthorized: invalid API key");
            return unauthorized();
        }

        debug!("API key authentication successful");
        let response = next.run(request).await;
        info!("Completed with status {}", response.status());
        response
    }
    .instrument(span)
    .await
}
