//! Shared-secret authentication for the chat bridge endpoint

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct BridgeAuth {
    /// Expected bearer token (None = auth disabled)
    pub token: Option<String>,
}

impl BridgeAuth {
    pub fn new(token: Option<String>) -> Self {
        Self { token }
    }

    pub fn is_enabled(&self) -> bool {
        self.token.is_some()
    }

    pub fn validate(&self, presented: &str) -> bool {
        match &self.token {
            Some(expected) => constant_time_eq(expected.as_bytes(), presented.as_bytes()),
            None => true, // Auth disabled, allow all
        }
    }
}

/// Constant-time byte comparison to prevent timing attacks
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Percent-decoded query parameter
fn query_param(request: &Request<Body>, key: &str) -> Option<String> {
    let Query(mut params) =
        Query::<HashMap<String, String>>::try_from_uri(request.uri()).ok()?;
    params.remove(key)
}

/// Token from `Authorization: Bearer ...`, or `?token=...` for WebSocket
/// clients that cannot set headers
fn presented_token(request: &Request<Body>) -> Option<String> {
    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
        .or_else(|| query_param(request, "token"))
}

/// Middleware that rejects bridge requests without the shared token
pub async fn bridge_auth_middleware(
    State(auth): State<Arc<BridgeAuth>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    if !auth.is_enabled() {
        return next.run(request).await;
    }

    if presented_token(&request).is_some_and(|t| auth.validate(&t)) {
        return next.run(request).await;
    }

    tracing::warn!("Rejected bridge request to {}", request.uri().path());
    (
        StatusCode::UNAUTHORIZED,
        [(header::WWW_AUTHENTICATE, "Bearer")],
        "Unauthorized",
    )
        .into_response()
}
