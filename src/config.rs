//! Deployment configuration.
//!
//! The CLI layer (clap with env fallbacks, `.env` via dotenvy) collects raw
//! values; this module validates them once at startup so the search loop
//! never sees an invalid bit-length or round count.

use std::time::Duration;

use sha2::{Digest, Sha256};

use crate::error::GenerateError;
use crate::primality::{MillerRabin, DEFAULT_ROUNDS, MIN_ROUNDS};

/// Bit-length of generated primes when nothing else is configured.
pub const DEFAULT_BITS: u32 = 1024;

pub const DEFAULT_PORT: u16 = 8080;

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Validated parameters of the prime search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratorConfig {
    bits: u32,
    mr_rounds: u32,
}

impl GeneratorConfig {
    pub fn new(bits: u32, mr_rounds: u32) -> Result<Self, GenerateError> {
        if bits < 2 {
            return Err(GenerateError::InvalidBitLength(bits));
        }
        if mr_rounds < MIN_ROUNDS {
            return Err(GenerateError::InvalidRounds(mr_rounds));
        }
        Ok(GeneratorConfig { bits, mr_rounds })
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn mr_rounds(&self) -> u32 {
        self.mr_rounds
    }

    pub fn tester(&self) -> MillerRabin {
        MillerRabin::new(self.mr_rounds)
    }
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            bits: DEFAULT_BITS,
            mr_rounds: DEFAULT_ROUNDS,
        }
    }
}

/// HTTP service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub generator: GeneratorConfig,
    /// Per-request budget for one generation, enforced at iteration boundaries.
    pub timeout: Duration,
    /// Maximum concurrent searches on the blocking pool.
    pub max_concurrent: usize,
    admin_token_digest: Option<[u8; 32]>,
}

impl ServerConfig {
    pub fn new(port: u16, generator: GeneratorConfig) -> Self {
        ServerConfig {
            port,
            generator,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_concurrent: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            admin_token_digest: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Zero is treated as one: the service must be able to run a search.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n.max(1);
        self
    }

    /// Enable the exit endpoint, guarded by this bearer token. Blank tokens
    /// leave it disabled.
    pub fn with_admin_token(mut self, token: Option<&str>) -> Self {
        self.admin_token_digest = token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(token_digest);
        self
    }

    pub fn exit_enabled(&self) -> bool {
        self.admin_token_digest.is_some()
    }

    /// Compare a presented token against the configured one by digest.
    pub fn admin_token_matches(&self, presented: &str) -> bool {
        self.admin_token_digest
            .is_some_and(|expected| token_digest(presented) == expected)
    }
}

fn token_digest(token: &str) -> [u8; 32] {
    Sha256::digest(token.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generator_defaults() {
        let cfg = GeneratorConfig::default();
        assert_eq!(cfg.bits(), 1024);
        assert_eq!(cfg.mr_rounds(), 20);
        assert_eq!(cfg.tester().rounds(), 20);
    }

    #[test]
    fn generator_rejects_invalid_values() {
        assert!(matches!(
            GeneratorConfig::new(1, 20),
            Err(GenerateError::InvalidBitLength(1))
        ));
        assert!(matches!(
            GeneratorConfig::new(1024, 19),
            Err(GenerateError::InvalidRounds(19))
        ));
        assert!(GeneratorConfig::new(2, 64).is_ok());
    }

    #[test]
    fn exit_disabled_without_token() {
        let cfg = ServerConfig::new(DEFAULT_PORT, GeneratorConfig::default());
        assert!(!cfg.exit_enabled());
        assert!(!cfg.admin_token_matches(""));

        let blank = cfg.with_admin_token(Some("   "));
        assert!(!blank.exit_enabled());
    }

    #[test]
    fn admin_token_matching() {
        let cfg = ServerConfig::new(DEFAULT_PORT, GeneratorConfig::default())
            .with_admin_token(Some("s3cret"));
        assert!(cfg.exit_enabled());
        assert!(cfg.admin_token_matches("s3cret"));
        assert!(!cfg.admin_token_matches("s3cre"));
        assert!(!cfg.admin_token_matches(""));
    }

    #[test]
    fn max_concurrent_floor_is_one() {
        let cfg = ServerConfig::new(DEFAULT_PORT, GeneratorConfig::default()).with_max_concurrent(0);
        assert_eq!(cfg.max_concurrent, 1);
    }
}
