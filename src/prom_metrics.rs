//! # Prometheus Metrics — Exposition for Container Orchestration
//!
//! Exposes vanityprime operational metrics in the Prometheus text exposition
//! format for scraping by Prometheus or any OpenMetrics-compatible collector.
//!
//! ## Metrics Exposed
//!
//! | Metric | Type | Labels | Description |
//! |--------|------|--------|-------------|
//! | `vanityprime_primes_generated_total` | Counter | — | Primes returned to callers |
//! | `vanityprime_candidates_discarded_total` | Counter | `outcome` | Candidates thrown away, by reason |
//! | `vanityprime_generation_failures_total` | Counter | `reason` | Failed generations |
//! | `vanityprime_generation_seconds` | Histogram | — | Wall time per generated prime |
//! | `vanityprime_generations_in_flight` | Gauge | — | Searches currently running |
//! | `vanityprime_http_request_duration_seconds` | Histogram | `method`, `path` | Request latency |
//!
//! The `/metrics` endpoint renders the current registry state on each scrape.

use prometheus_client::encoding::text::encode;
use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::family::Family;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::metrics::histogram::{exponential_buckets, Histogram};
use prometheus_client::registry::Registry;

use crate::search::SearchStats;

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct OutcomeLabel {
    pub outcome: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct ReasonLabel {
    pub reason: String,
}

#[derive(Clone, Debug, Hash, PartialEq, Eq, prometheus_client::encoding::EncodeLabelSet)]
pub struct HttpLabel {
    pub method: String,
    pub path: String,
}

type HistogramFamily<L> = Family<L, Histogram, fn() -> Histogram>;

fn generation_histogram() -> Histogram {
    // 10ms .. ~80s
    Histogram::new(exponential_buckets(0.01, 2.0, 14))
}

fn latency_histogram() -> Histogram {
    Histogram::new(exponential_buckets(0.001, 2.0, 16))
}

/// Thread-safe metrics registry. All metric handles are atomic and may be
/// updated from any thread, including the blocking pool running searches.
pub struct Metrics {
    pub registry: Registry,
    pub primes_generated: Counter,
    pub candidates_discarded: Family<OutcomeLabel, Counter>,
    pub generation_failures: Family<ReasonLabel, Counter>,
    pub generation_seconds: Histogram,
    pub generations_in_flight: Gauge,
    pub http_request_duration: HistogramFamily<HttpLabel>,
}

impl Metrics {
    pub fn new() -> Self {
        let mut registry = Registry::default();

        let primes_generated = Counter::default();
        registry.register(
            "vanityprime_primes_generated",
            "Primes returned to callers",
            primes_generated.clone(),
        );

        let candidates_discarded = Family::<OutcomeLabel, Counter>::default();
        registry.register(
            "vanityprime_candidates_discarded",
            "Candidates discarded by the search loop, by outcome",
            candidates_discarded.clone(),
        );

        let generation_failures = Family::<ReasonLabel, Counter>::default();
        registry.register(
            "vanityprime_generation_failures",
            "Prime generations that returned an error, by reason",
            generation_failures.clone(),
        );

        let generation_seconds = generation_histogram();
        registry.register(
            "vanityprime_generation_seconds",
            "Wall-clock seconds spent generating one prime",
            generation_seconds.clone(),
        );

        let generations_in_flight = Gauge::default();
        registry.register(
            "vanityprime_generations_in_flight",
            "Prime searches currently running",
            generations_in_flight.clone(),
        );

        let http_request_duration: HistogramFamily<HttpLabel> =
            Family::new_with_constructor(latency_histogram);
        registry.register(
            "vanityprime_http_request_duration_seconds",
            "HTTP request latency by method and route",
            http_request_duration.clone(),
        );

        Self {
            registry,
            primes_generated,
            candidates_discarded,
            generation_failures,
            generation_seconds,
            generations_in_flight,
            http_request_duration,
        }
    }

    /// Record a successful generation and its discarded candidates.
    pub fn record_success(&self, stats: &SearchStats, elapsed_secs: f64) {
        self.primes_generated.inc();
        self.generation_seconds.observe(elapsed_secs);
        for (outcome, n) in [
            ("sieve_exhausted", stats.sieve_exhausted),
            ("overflow", stats.overflows),
            ("composite", stats.composites),
        ] {
            if n > 0 {
                self.candidates_discarded
                    .get_or_create(&OutcomeLabel {
                        outcome: outcome.to_string(),
                    })
                    .inc_by(n);
            }
        }
    }

    pub fn record_failure(&self, reason: &str) {
        self.generation_failures
            .get_or_create(&ReasonLabel {
                reason: reason.to_string(),
            })
            .inc();
    }

    /// Render all metrics in Prometheus text exposition format.
    pub fn encode(&self) -> String {
        let mut buf = String::new();
        if let Err(e) = encode(&mut buf, &self.registry) {
            tracing::warn!(error = %e, "failed to encode metrics");
        }
        buf
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
