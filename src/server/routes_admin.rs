//! Administrative exit endpoint.
//!
//! Shutting the service down is never reachable anonymously. The route only
//! exists when an admin token is configured (404 otherwise) and requires
//! `Authorization: Bearer <token>`. A successful request triggers Axum's
//! graceful shutdown rather than killing the process outright, so in-flight
//! responses still complete.

use axum::extract::{FromRequestParts, State};
use axum::http::request::Parts;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use std::sync::Arc;
use tracing::{info, warn};

use super::AppState;

/// Extractor that admits only requests carrying the configured admin token.
pub struct RequireAdmin;

impl FromRequestParts<Arc<AppState>> for RequireAdmin {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if !state.config.exit_enabled() {
            return Err(StatusCode::NOT_FOUND.into_response());
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "));

        match token {
            Some(t) if state.config.admin_token_matches(t) => Ok(RequireAdmin),
            _ => {
                warn!(path = %parts.uri.path(), "rejected unauthenticated admin request");
                Err((
                    StatusCode::UNAUTHORIZED,
                    Json(serde_json::json!({"error": "Authentication required"})),
                )
                    .into_response())
            }
        }
    }
}

pub async fn handler_exit(
    State(state): State<Arc<AppState>>,
    _admin: RequireAdmin,
) -> impl IntoResponse {
    info!("exit requested via admin endpoint");
    state.shutdown.notify_one();
    (StatusCode::OK, "exiting")
}
