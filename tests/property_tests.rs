//! Property-based tests for vanityprime's generation pipeline.
//!
//! These tests use the `proptest` framework to verify invariants across
//! randomly generated inputs rather than hand-picked examples.
//!
//! # How to run
//!
//! ```bash
//! # Run all property tests:
//! cargo test --test property_tests
//!
//! # Increase case count for thorough testing (default is 256):
//! PROPTEST_CASES=10000 cargo test --test property_tests
//! ```
//!
//! # Testing strategy
//!
//! Properties are organized by pipeline stage:
//! - **Shaper**: any byte buffer shapes to an odd value of exactly the target
//!   length with both top bits set.
//! - **Sieve**: the residue agrees with direct division, and the chosen delta
//!   is the smallest even offset clearing every table prime.
//! - **Orchestrator**: a search driven by any seeded generator only accepts values
//!   satisfying every output invariant.
//!
//! Each property is named `prop_<function>_<invariant>`.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rug::integer::Order;
use rug::Integer;
use vanityprime::primality::{MillerRabin, PrimalityTester};
use vanityprime::search::PrimeSearch;
use vanityprime::shaper::{buffer_len, is_well_shaped, shape_candidate};
use vanityprime::sieve::{find_delta, residue, SieveOutcome, SMALL_PRIMES, SMALL_PRIMES_PRODUCT};

/// Bit-length plus a byte buffer of exactly the matching size.
fn bits_and_bytes() -> impl Strategy<Value = (u32, Vec<u8>)> {
    (2u32..=1100).prop_flat_map(|bits| {
        (
            Just(bits),
            prop::collection::vec(any::<u8>(), buffer_len(bits)),
        )
    })
}

// == Shaper ====================================================================

proptest! {
    /// **Property**: shaped candidates have exactly `bits` bits, are odd, and
    /// have their two most-significant bits set, for every input buffer.
    #[test]
    fn prop_shape_candidate_invariants((bits, mut bytes) in bits_and_bytes()) {
        let n = shape_candidate(bits, &mut bytes);
        prop_assert!(is_well_shaped(&n, bits), "bits={} n={:x}", bits, n);
    }

    /// **Property**: shaping only touches the forced bits; the buffer after
    /// shaping is the big-endian image of the returned value.
    #[test]
    fn prop_shape_candidate_matches_buffer((bits, mut bytes) in bits_and_bytes()) {
        let n = shape_candidate(bits, &mut bytes);
        prop_assert_eq!(n, Integer::from_digits(&bytes[..], Order::Msf));
    }
}

// == Sieve =====================================================================

proptest! {
    /// **Property**: residue(n) == n mod P for arbitrary 1024-bit inputs.
    #[test]
    fn prop_residue_matches_big_int(bytes in prop::collection::vec(any::<u8>(), 128)) {
        let n = Integer::from_digits(&bytes[..], Order::Msf);
        let expected = Integer::from(n.clone() % Integer::from(SMALL_PRIMES_PRODUCT));
        prop_assert_eq!(Integer::from(residue(&n)), expected);
    }

    /// **Property**: find_delta returns the smallest even offset such that
    /// candidate + delta is coprime to every table prime.
    #[test]
    fn prop_find_delta_minimal_and_clean((bits, mut bytes) in bits_and_bytes()) {
        prop_assume!(bits > 6);
        let n = shape_candidate(bits, &mut bytes);
        let SieveOutcome::Delta(delta) = find_delta(residue(&n), bits) else {
            return Err(TestCaseError::fail("sieve exhausted on a shaped candidate"));
        };
        prop_assert_eq!(delta % 2, 0);

        let clean = |d: u64| {
            let m = Integer::from(&n + d);
            SMALL_PRIMES.iter().all(|&q| !m.is_divisible_u(q as u32))
        };
        prop_assert!(clean(delta));
        for smaller in (0..delta).step_by(2) {
            prop_assert!(!clean(smaller), "delta {} not minimal, {} also clean", delta, smaller);
        }
    }
}

// == Orchestrator ==============================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    /// **Property**: every accepted prime is well shaped, coprime to the
    /// sieve table, and passes an independent high-round test.
    #[test]
    fn prop_search_output_invariants(seed in any::<u64>(), bits in 16u32..=160) {
        let rng = StdRng::seed_from_u64(seed);
        let p = PrimeSearch::new(rng, MillerRabin::default(), bits)
            .unwrap()
            .run()
            .unwrap();

        prop_assert!(is_well_shaped(&p, bits));
        for &q in &SMALL_PRIMES {
            prop_assert!(!p.is_divisible_u(q as u32), "{} divides accepted prime", q);
        }
        prop_assert!(MillerRabin::new(40).is_probably_prime(&p));
    }

    /// **Property**: planting a table prime as a factor always yields a
    /// composite verdict.
    #[test]
    fn prop_planted_factor_rejected(seed in any::<u64>(), idx in 0usize..SMALL_PRIMES.len()) {
        let rng = StdRng::seed_from_u64(seed);
        let p = PrimeSearch::new(rng, MillerRabin::default(), 128)
            .unwrap()
            .run()
            .unwrap();
        let planted = Integer::from(&p * SMALL_PRIMES[idx]);
        prop_assert!(!MillerRabin::default().is_probably_prime(&planted));
    }
}
