//! Prime generation endpoints.
//!
//! Both routes share [`generate`], which acquires a search permit, runs the
//! search on the blocking pool, and stops it at the next iteration boundary
//! when either the per-request deadline passes or the request future is
//! dropped (client gone, outer timeout).

use super::AppState;
use crate::error::GenerateError;
use crate::search::{Deadline, SearchStats};
use crate::Generated;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use chrono::{DateTime, Utc};
use prometheus_client::metrics::gauge::Gauge;
use serde::Serialize;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

#[derive(Serialize)]
pub(super) struct PrimeResponse {
    prime: String,
    bits: u32,
    mr_rounds: u32,
    stats: SearchStats,
    elapsed_ms: u64,
    generated_at: DateTime<Utc>,
}

/// Raises its flag when dropped, cancelling a search whose caller went away.
struct CancelOnDrop(Arc<AtomicBool>);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

/// First `vs` value in the query string. Repeated parameters are accepted
/// and only the first one is used.
fn first_vs(params: Vec<(String, String)>) -> Option<String> {
    params.into_iter().find(|(k, _)| k == "vs").map(|(_, v)| v)
}

/// Holds the in-flight gauge up for the lifetime of one search, including
/// one that unwinds.
struct InFlight<'a>(&'a Gauge);

impl<'a> InFlight<'a> {
    fn enter(gauge: &'a Gauge) -> Self {
        gauge.inc();
        InFlight(gauge)
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.dec();
    }
}

/// Plain-text endpoint. A missing `vs` parameter is answered with a fixed
/// message; failures produce an empty body with an error status.
pub(super) async fn handler_vanity_prime(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let Some(vanity) = first_vs(params) else {
        return (StatusCode::OK, "no vs param").into_response();
    };
    match generate(&state, vanity).await {
        Ok(g) => (StatusCode::OK, g.hex()).into_response(),
        Err(status) => (status, String::new()).into_response(),
    }
}

/// JSON endpoint with search statistics. `vs` is optional here.
pub(super) async fn handler_api_prime(
    State(state): State<Arc<AppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Response {
    let generator = state.config.generator;
    match generate(&state, first_vs(params).unwrap_or_default()).await {
        Ok(g) => Json(PrimeResponse {
            prime: g.hex(),
            bits: generator.bits(),
            mr_rounds: generator.mr_rounds(),
            stats: g.stats,
            elapsed_ms: g.elapsed.as_millis() as u64,
            generated_at: Utc::now(),
        })
        .into_response(),
        Err(status) => (
            status,
            Json(serde_json::json!({
                "error": status.canonical_reason().unwrap_or("generation failed")
            })),
        )
            .into_response(),
    }
}

/// Run one search for a request. Errors are mapped to the status the client
/// sees: 503 when the service is saturated or the deadline passed, 500 for
/// entropy failure or a crashed worker.
pub(super) async fn generate(state: &Arc<AppState>, vanity: String) -> Result<Generated, StatusCode> {
    let budget = state.config.timeout;
    let deadline = Instant::now() + budget;

    let permit = match tokio::time::timeout(budget, Arc::clone(&state.permits).acquire_owned()).await
    {
        Ok(Ok(permit)) => permit,
        Ok(Err(_)) | Err(_) => {
            warn!("no search permit available before deadline");
            state.prom_metrics.record_failure("busy");
            return Err(StatusCode::SERVICE_UNAVAILABLE);
        }
    };

    let cancel = CancelOnDrop(Arc::new(AtomicBool::new(false)));
    let stop = (Arc::clone(&cancel.0), Deadline(deadline));
    let generator = state.config.generator;
    let worker = Arc::clone(state);
    let joined = tokio::task::spawn_blocking(move || {
        let _permit = permit;
        let _in_flight = InFlight::enter(&worker.prom_metrics.generations_in_flight);
        debug!(vanity_len = vanity.len(), bits = generator.bits(), "vanity prime requested");
        let rng = (worker.rng_source)();
        crate::generate_with_rng(rng, &generator, Some(&stop))
    })
    .await;
    drop(cancel);

    match joined {
        Ok(Ok(g)) => {
            state
                .prom_metrics
                .record_success(&g.stats, g.elapsed.as_secs_f64());
            info!(
                bits = generator.bits(),
                iterations = g.stats.iterations,
                elapsed_ms = g.elapsed.as_millis() as u64,
                "prime generated"
            );
            Ok(g)
        }
        Ok(Err(GenerateError::Cancelled)) => {
            warn!(budget_secs = budget.as_secs_f64(), "prime search hit deadline");
            state.prom_metrics.record_failure("cancelled");
            Err(StatusCode::SERVICE_UNAVAILABLE)
        }
        Ok(Err(e)) => {
            error!(error = %e, "prime generation failed");
            state.prom_metrics.record_failure(e.reason());
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
        Err(e) => {
            error!(error = %e, "prime search task panicked");
            state.prom_metrics.record_failure("panic");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
