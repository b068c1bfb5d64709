pub mod config;
pub mod error;
pub mod primality;
pub mod prom_metrics;
pub mod search;
pub mod server;
pub mod shaper;
pub mod sieve;

use std::time::{Duration, Instant};

use rand::rngs::OsRng;
use rand::RngCore;
use rug::Integer;
use tracing::debug;

pub use config::{GeneratorConfig, ServerConfig, DEFAULT_BITS};
pub use error::GenerateError;
pub use primality::{MillerRabin, PrimalityTester};
pub use search::{Deadline, PrimeSearch, SearchStats, StopSignal};

/// An accepted prime together with how the search went.
#[derive(Debug, Clone)]
pub struct Generated {
    pub prime: Integer,
    pub stats: SearchStats,
    pub elapsed: Duration,
}

impl Generated {
    pub fn hex(&self) -> String {
        to_hex(&self.prime)
    }
}

/// Lowercase hexadecimal, no prefix.
pub fn to_hex(n: &Integer) -> String {
    n.to_string_radix(16)
}

/// Generate a `bits`-bit probable prime from the OS entropy source.
pub fn generate_prime(bits: u32, mr_rounds: u32) -> Result<Integer, GenerateError> {
    let config = GeneratorConfig::new(bits, mr_rounds)?;
    generate_with(&config, None).map(|g| g.prime)
}

/// Run one search under `config`, optionally interruptible by `stop`.
pub fn generate_with(
    config: &GeneratorConfig,
    stop: Option<&dyn StopSignal>,
) -> Result<Generated, GenerateError> {
    generate_with_rng(OsRng, config, stop)
}

/// Same as [`generate_with`], drawing candidates from `rng`.
///
/// `rng` must be cryptographically secure in production; any entropy failure
/// it reports ends the search with [`GenerateError::RandomSource`].
pub fn generate_with_rng<R: RngCore>(
    rng: R,
    config: &GeneratorConfig,
    stop: Option<&dyn StopSignal>,
) -> Result<Generated, GenerateError> {
    let start = Instant::now();
    let mut search = PrimeSearch::new(rng, config.tester(), config.bits())?;
    if let Some(stop) = stop {
        search = search.with_stop(stop);
    }
    let (prime, stats) = search.run_with_stats()?;
    Ok(Generated {
        prime,
        stats,
        elapsed: start.elapsed(),
    })
}

/// Default-deployment entry point: a 1024-bit prime as lowercase hex.
///
/// `vanity` is accepted but does not influence the result.
pub fn generate_vanity_prime(vanity: &str) -> Result<String, GenerateError> {
    generate_vanity_prime_with(&GeneratorConfig::default(), vanity, None).map(|g| g.hex())
}

/// Configured entry point used by the HTTP layer and CLI.
pub fn generate_vanity_prime_with(
    config: &GeneratorConfig,
    vanity: &str,
    stop: Option<&dyn StopSignal>,
) -> Result<Generated, GenerateError> {
    debug!(vanity_len = vanity.len(), bits = config.bits(), "vanity prime requested");
    generate_with(config, stop)
}
