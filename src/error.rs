//! Error taxonomy for prime generation.
//!
//! Only entropy failure, cancellation, and invalid configuration escape the
//! search loop. Sieve exhaustion and composite verdicts are ordinary outcomes
//! that the orchestrator resolves by drawing a fresh candidate, so they never
//! appear here.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum GenerateError {
    /// The secure randomness source could not supply bytes. Fatal for the
    /// current invocation and never retried.
    #[error("random source failed: {0}")]
    RandomSource(#[from] rand::Error),

    /// A stop signal fired at an iteration boundary before a prime was accepted.
    #[error("prime search cancelled")]
    Cancelled,

    #[error("bit length {0} is too small (minimum 2)")]
    InvalidBitLength(u32),

    #[error("{0} Miller-Rabin rounds requested (minimum {min})", min = crate::primality::MIN_ROUNDS)]
    InvalidRounds(u32),
}

impl GenerateError {
    /// Short machine-readable label, used as a metrics label and log field.
    pub fn reason(&self) -> &'static str {
        match self {
            GenerateError::RandomSource(_) => "random_source",
            GenerateError::Cancelled => "cancelled",
            GenerateError::InvalidBitLength(_) => "invalid_bit_length",
            GenerateError::InvalidRounds(_) => "invalid_rounds",
        }
    }
}
