//! # Sieve — Small-Prime Pre-Filter with Bounded Delta Search
//!
//! Cheaply rejects candidates divisible by a small odd prime before the
//! Miller–Rabin test runs. Provides:
//!
//! 1. **Small-prime table** (`SMALL_PRIMES`): the odd primes 3..=53, truncated
//!    where the running product would overflow a `u64`. Two is excluded since
//!    shaped candidates are odd by construction.
//! 2. **Residue reduction** (`residue`): one big-integer reduction per
//!    candidate, modulo the product of the table.
//! 3. **Delta search** (`find_delta`): scans even offsets `0, 2, 4, ...` of the
//!    residue in plain `u64` arithmetic until one is coprime to every table
//!    prime, or the bound is reached.
//!
//! ## Algorithm: Residue Batching
//!
//! Since every table prime divides `SMALL_PRIMES_PRODUCT`, for any candidate
//! `c` and offset `d`: `(c + d) mod q == (c mod P + d) mod q` for each prime
//! `q`. A single `Integer` reduction therefore replaces fifteen, and the delta
//! scan never touches arbitrary precision again. Stepping by two preserves the
//! oddness the shaper enforced.
//!
//! By Mertens' theorem, about 0.56 / ln(53) * 2 ≈ 28% of odd integers survive
//! the table, so the expected scan length is a handful of offsets and the
//! `MAX_DELTA` bound is essentially never reached at production sizes.

use rug::Integer;

/// Odd primes whose product still fits in a `u64`.
pub const SMALL_PRIMES: [u64; 15] = [3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47, 53];

/// Product of `SMALL_PRIMES` (16294579238595022365).
pub const SMALL_PRIMES_PRODUCT: u64 = product(&SMALL_PRIMES);

/// Exclusive upper bound on the delta scan.
pub const MAX_DELTA: u64 = 1 << 20;

/// Below this bit-length a candidate may itself be one of the table primes.
const SELF_PRIME_MAX_BITS: u32 = 6;

const fn product(primes: &[u64]) -> u64 {
    let mut acc = 1u64;
    let mut i = 0;
    while i < primes.len() {
        acc *= primes[i];
        i += 1;
    }
    acc
}

/// Result of a delta search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SieveOutcome {
    /// `candidate + delta` has no factor in the table.
    Delta(u64),
    /// No surviving offset below the bound; draw a new candidate.
    Exhausted,
}

/// `n mod SMALL_PRIMES_PRODUCT`.
pub fn residue(n: &Integer) -> u64 {
    let modulus = Integer::from(SMALL_PRIMES_PRODUCT);
    // The remainder is below a u64 modulus, so the conversion cannot fail.
    Integer::from(n % &modulus).to_u64().unwrap_or_default()
}

/// True if some table prime divides `m`. A prime equal to `m` only counts as
/// a divisor when candidates are too large to be table primes themselves.
fn has_table_factor(m: u64, bits: u32) -> bool {
    SMALL_PRIMES
        .iter()
        .any(|&q| m % q == 0 && (bits > SELF_PRIME_MAX_BITS || m != q))
}

/// Smallest even delta below `MAX_DELTA` that clears the table.
pub fn find_delta(residue: u64, bits: u32) -> SieveOutcome {
    find_delta_within(residue, bits, MAX_DELTA)
}

/// `find_delta` with an explicit exclusive bound.
pub fn find_delta_within(residue: u64, bits: u32, bound: u64) -> SieveOutcome {
    // residue < P < 2^64 - 2^20, so residue + delta never wraps.
    (0..bound)
        .step_by(2)
        .find(|&delta| !has_table_factor(residue + delta, bits))
        .map_or(SieveOutcome::Exhausted, SieveOutcome::Delta)
}

/// Direct table check on a full integer, used when reporting on arbitrary
/// values rather than shaped candidates.
pub fn has_small_factor(n: &Integer) -> bool {
    if n.is_even() {
        return *n != 2u32;
    }
    SMALL_PRIMES
        .iter()
        .any(|&q| n.is_divisible_u(q as u32) && *n != q)
}
