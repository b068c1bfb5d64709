//! # Server — HTTP Front End for Prime Generation
//!
//! Runs an Axum HTTP server exposing the generator to the network. Searches
//! are CPU-bound and unbounded, so every request runs its search on Tokio's
//! blocking pool behind a semaphore, with a deadline the search polls between
//! iterations.
//!
//! | Endpoint | Purpose |
//! |----------|---------|
//! | `GET /.well-known/vanityprime?vs=` | Prime as lowercase hex (`text/plain`) |
//! | `GET /api/prime?vs=` | Prime plus search statistics (JSON) |
//! | `GET,POST /.well-known/vpexit` | Graceful shutdown, admin token required |
//! | `GET /healthz` | Liveness |
//! | `GET /metrics` | Prometheus scraping endpoint |

mod routes_admin;
mod routes_health;
mod routes_prime;

use crate::config::ServerConfig;
use crate::prom_metrics;
use anyhow::{Context, Result};
use axum::extract::{MatchedPath, Request, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::Next;
use axum::routing::get;
use axum::Router;
use rand::rngs::OsRng;
use rand::RngCore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, Semaphore};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Instrument};

/// Slack on top of the generation budget before the HTTP layer gives up.
const REQUEST_TIMEOUT_SLACK: Duration = Duration::from_secs(5);

/// Builds the randomness source for one search. Called once per request on
/// the blocking pool.
pub type RngSource = Arc<dyn Fn() -> Box<dyn RngCore + Send> + Send + Sync>;

fn os_rng() -> Box<dyn RngCore + Send> {
    Box::new(OsRng)
}

pub struct AppState {
    pub config: ServerConfig,
    pub prom_metrics: prom_metrics::Metrics,
    pub permits: Arc<Semaphore>,
    pub shutdown: Notify,
    pub rng_source: RngSource,
}

impl AppState {
    /// State drawing candidates from the OS entropy source.
    pub fn new(config: ServerConfig) -> Arc<Self> {
        Self::with_rng_source(config, Arc::new(os_rng))
    }

    pub fn with_rng_source(config: ServerConfig, rng_source: RngSource) -> Arc<Self> {
        Arc::new(AppState {
            permits: Arc::new(Semaphore::new(config.max_concurrent)),
            config,
            prom_metrics: prom_metrics::Metrics::new(),
            shutdown: Notify::new(),
            rng_source,
        })
    }
}

/// Records request latency per matched route, propagates or generates a
/// request ID, and wraps the request in a tracing span.
async fn metrics_middleware(
    State(state): State<Arc<AppState>>,
    req: Request,
    next: Next,
) -> axum::response::Response {
    let request_id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let method = req.method().to_string();
    // Matched route rather than raw URI keeps label cardinality bounded.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| "unmatched".to_string());
    let start = std::time::Instant::now();

    let span = tracing::info_span!(
        "request",
        request_id = %request_id,
        method = %method,
        path = %req.uri().path(),
    );
    let mut response = next.run(req).instrument(span).await;

    state
        .prom_metrics
        .http_request_duration
        .get_or_create(&prom_metrics::HttpLabel {
            method,
            path: route,
        })
        .observe(start.elapsed().as_secs_f64());

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert("x-request-id", value);
    }
    response
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let request_timeout = state.config.timeout + REQUEST_TIMEOUT_SLACK;

    Router::new()
        .route(
            "/.well-known/vanityprime",
            get(routes_prime::handler_vanity_prime),
        )
        .route("/api/prime", get(routes_prime::handler_api_prime))
        .route(
            "/.well-known/vpexit",
            get(routes_admin::handler_exit).post(routes_admin::handler_exit),
        )
        .route("/healthz", get(routes_health::handler_healthz))
        .route("/metrics", get(routes_health::handler_metrics))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods([Method::GET])
                .allow_headers(Any),
        )
        .layer(CatchPanicLayer::new())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            metrics_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(16 * 1024))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .with_state(state)
}

pub async fn run(config: ServerConfig) -> Result<()> {
    let port = config.port;
    let state = AppState::new(config);
    let app = build_router(Arc::clone(&state));

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind port {}", port))?;
    info!(
        port,
        bits = state.config.generator.bits(),
        mr_rounds = state.config.generator.mr_rounds(),
        max_concurrent = state.config.max_concurrent,
        exit_enabled = state.config.exit_enabled(),
        "vanityprime listening"
    );
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(Arc::clone(&state)))
        .await?;
    info!("server shut down gracefully");
    Ok(())
}

/// Resolves on SIGINT, SIGTERM, or an authorised exit request.
async fn shutdown_signal(state: Arc<AppState>) {
    let ctrl_c = tokio::signal::ctrl_c();
    let exit = state.shutdown.notified();
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => tokio::select! {
                _ = ctrl_c => info!("received SIGINT, shutting down"),
                _ = sigterm.recv() => info!("received SIGTERM, shutting down"),
                _ = exit => info!("exit requested, shutting down"),
            },
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                tokio::select! {
                    _ = ctrl_c => info!("received SIGINT, shutting down"),
                    _ = exit => info!("exit requested, shutting down"),
                }
            }
        }
    }
    #[cfg(not(unix))]
    {
        tokio::select! {
            _ = ctrl_c => info!("received SIGINT, shutting down"),
            _ = exit => info!("exit requested, shutting down"),
        }
    }
}
