//! # Primality — Probabilistic Compositeness Test
//!
//! The authoritative backstop after the sieve. `MillerRabin` delegates to
//! GMP's `mpz_probab_prime_p` through `rug`, which combines trial division,
//! a Baillie–PSW test, and `rounds - 24` extra Miller–Rabin rounds. A true
//! prime is never reported composite; a composite passes with probability at
//! most `4^-rounds`.
//!
//! Two cheap rounds run first so that most composites are rejected before the
//! full round count is paid.

use rug::integer::IsPrime;
use rug::Integer;

/// Lowest round count accepted by configuration (false-positive rate 4^-20).
pub const MIN_ROUNDS: u32 = 20;

/// Round count used when nothing else is configured.
pub const DEFAULT_ROUNDS: u32 = 20;

/// Pure "probably prime" verdict. Implementations must hold no per-call state.
pub trait PrimalityTester: Send + Sync {
    fn is_probably_prime(&self, n: &Integer) -> bool;
}

/// Miller–Rabin style tester with a fixed round count.
#[derive(Debug, Clone, Copy)]
pub struct MillerRabin {
    rounds: u32,
}

impl MillerRabin {
    pub fn new(rounds: u32) -> Self {
        MillerRabin { rounds }
    }

    pub fn rounds(&self) -> u32 {
        self.rounds
    }
}

impl Default for MillerRabin {
    fn default() -> Self {
        MillerRabin::new(DEFAULT_ROUNDS)
    }
}

impl PrimalityTester for MillerRabin {
    fn is_probably_prime(&self, n: &Integer) -> bool {
        mr_screened_test(n, self.rounds) != IsPrime::No
    }
}

/// Two-round pre-screen, then the full round count for survivors.
pub fn mr_screened_test(candidate: &Integer, mr_rounds: u32) -> IsPrime {
    if mr_rounds > 2 && candidate.is_probably_prime(2) == IsPrime::No {
        return IsPrime::No;
    }
    candidate.is_probably_prime(mr_rounds)
}
