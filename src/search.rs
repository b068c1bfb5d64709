//! # Search — Shape / Sieve / Test Orchestration
//!
//! Drives the retry loop that turns random bytes into an accepted prime. The
//! loop is an explicit state machine with one transition per call to
//! [`PrimeSearch::step`], so each transition can be exercised in isolation
//! with a scripted randomness source or tester.
//!
//! ```text
//!   ┌──────────── exhausted / overflow / composite ────────────┐
//!   v                                                          │
//! Shape ──candidate──> Sieve ──candidate + delta──> Test ──────┘
//!   │                                                 │
//!   └─ entropy error / stop ─> Failed     Accepted <──┘ probably prime
//! ```
//!
//! There is no iteration bound: with prime density ~ 1/ln(2^bits) the expected
//! number of cycles grows linearly with `bits`. Callers that must not block
//! indefinitely pass a [`StopSignal`], polled on every entry to **Shape**.
//! Cancellation is only observed at iteration boundaries; a single primality
//! test is short relative to the whole search.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rand::RngCore;
use rug::Integer;
use serde::Serialize;
use tracing::{debug, trace};

use crate::error::GenerateError;
use crate::primality::PrimalityTester;
use crate::shaper::{buffer_len, draw_candidate};
use crate::sieve::{find_delta_within, residue, SieveOutcome, MAX_DELTA};

/// External stop request, checked between iterations.
pub trait StopSignal: Send + Sync {
    fn is_stop_requested(&self) -> bool;
}

impl StopSignal for AtomicBool {
    fn is_stop_requested(&self) -> bool {
        self.load(Ordering::Relaxed)
    }
}

impl<S: StopSignal + ?Sized> StopSignal for Arc<S> {
    fn is_stop_requested(&self) -> bool {
        (**self).is_stop_requested()
    }
}

/// Either signal stops the search.
impl<A: StopSignal, B: StopSignal> StopSignal for (A, B) {
    fn is_stop_requested(&self) -> bool {
        self.0.is_stop_requested() || self.1.is_stop_requested()
    }
}

/// Stops the search once a wall-clock instant has passed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(pub Instant);

impl StopSignal for Deadline {
    fn is_stop_requested(&self) -> bool {
        Instant::now() >= self.0
    }
}

/// Per-search counters. Each discarded candidate increments exactly one of
/// `sieve_exhausted`, `overflows`, `composites`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SearchStats {
    pub iterations: u64,
    pub sieve_exhausted: u64,
    pub overflows: u64,
    pub composites: u64,
}

/// One state of the search. `Accepted` and `Failed` are terminal.
#[derive(Debug)]
pub enum State {
    Shape,
    Sieve(Integer),
    Test(Integer),
    Accepted(Integer),
    Failed(GenerateError),
}

pub struct PrimeSearch<'a, R, T> {
    rng: R,
    tester: T,
    bits: u32,
    delta_bound: u64,
    stop: Option<&'a dyn StopSignal>,
    buf: Vec<u8>,
    stats: SearchStats,
}

impl<'a, R: RngCore, T: PrimalityTester> PrimeSearch<'a, R, T> {
    pub fn new(rng: R, tester: T, bits: u32) -> Result<Self, GenerateError> {
        if bits < 2 {
            return Err(GenerateError::InvalidBitLength(bits));
        }
        Ok(PrimeSearch {
            rng,
            tester,
            bits,
            delta_bound: MAX_DELTA,
            stop: None,
            buf: vec![0u8; buffer_len(bits)],
            stats: SearchStats::default(),
        })
    }

    pub fn with_stop(mut self, stop: &'a dyn StopSignal) -> Self {
        self.stop = Some(stop);
        self
    }

    /// Override the sieve's exclusive delta bound.
    pub fn with_delta_bound(mut self, bound: u64) -> Self {
        self.delta_bound = bound;
        self
    }

    pub fn bits(&self) -> u32 {
        self.bits
    }

    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Perform a single transition.
    pub fn step(&mut self, state: State) -> State {
        match state {
            State::Shape => {
                if self.stop.is_some_and(|s| s.is_stop_requested()) {
                    return State::Failed(GenerateError::Cancelled);
                }
                self.stats.iterations += 1;
                match draw_candidate(&mut self.rng, self.bits, &mut self.buf) {
                    Ok(candidate) => State::Sieve(candidate),
                    Err(e) => State::Failed(e),
                }
            }
            State::Sieve(mut candidate) => {
                match find_delta_within(residue(&candidate), self.bits, self.delta_bound) {
                    SieveOutcome::Exhausted => {
                        self.stats.sieve_exhausted += 1;
                        trace!(bits = self.bits, "sieve exhausted, redrawing");
                        State::Shape
                    }
                    SieveOutcome::Delta(delta) => {
                        candidate += delta;
                        if candidate.significant_bits() != self.bits {
                            self.stats.overflows += 1;
                            trace!(bits = self.bits, delta, "delta overflowed bit length");
                            State::Shape
                        } else {
                            State::Test(candidate)
                        }
                    }
                }
            }
            State::Test(candidate) => {
                if self.tester.is_probably_prime(&candidate) {
                    State::Accepted(candidate)
                } else {
                    self.stats.composites += 1;
                    State::Shape
                }
            }
            terminal @ (State::Accepted(_) | State::Failed(_)) => terminal,
        }
    }

    /// Loop until a prime is accepted or the search fails.
    pub fn run(self) -> Result<Integer, GenerateError> {
        self.run_with_stats().map(|(p, _)| p)
    }

    pub fn run_with_stats(mut self) -> Result<(Integer, SearchStats), GenerateError> {
        let mut state = State::Shape;
        loop {
            state = self.step(state);
            match state {
                State::Accepted(prime) => {
                    debug!(
                        bits = self.bits,
                        iterations = self.stats.iterations,
                        composites = self.stats.composites,
                        sieve_exhausted = self.stats.sieve_exhausted,
                        overflows = self.stats.overflows,
                        "prime accepted"
                    );
                    return Ok((prime, self.stats));
                }
                State::Failed(e) => {
                    debug!(
                        bits = self.bits,
                        iterations = self.stats.iterations,
                        reason = e.reason(),
                        "prime search failed"
                    );
                    return Err(e);
                }
                _ => {}
            }
        }
    }
}
