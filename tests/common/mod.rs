//! Shared test helpers for integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use vanityprime::config::{GeneratorConfig, ServerConfig};
use vanityprime::server::{AppState, RngSource};

/// Small enough that every request finishes in milliseconds.
pub const TEST_BITS: u32 = 128;

pub fn test_config() -> ServerConfig {
    let generator = GeneratorConfig::new(TEST_BITS, 20).expect("valid test generator config");
    ServerConfig::new(0, generator)
}

/// App state for router tests, optionally with the exit endpoint enabled.
pub fn test_state(admin_token: Option<&str>) -> Arc<AppState> {
    AppState::new(test_config().with_admin_token(admin_token))
}

pub fn test_state_with(f: impl FnOnce(ServerConfig) -> ServerConfig) -> Arc<AppState> {
    AppState::new(f(test_config()))
}

/// App state whose searches draw from `rng_source` instead of the OS.
pub fn test_state_with_rng(rng_source: RngSource) -> Arc<AppState> {
    AppState::with_rng_source(test_config(), rng_source)
}
