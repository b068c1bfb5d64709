//! # Shaper — Random Bytes to Bit-Length-Constrained Candidates
//!
//! Turns a buffer of secure random bytes into an odd integer of exactly
//! `bits` bits whose two most-significant bits are set. Setting two high bits
//! rather than one means the product of two such values always has the full
//! `2 * bits` length.
//!
//! The buffer is interpreted big-endian, so byte 0 carries the high bits and
//! the last byte carries the parity bit.

use rand::RngCore;
use rug::integer::Order;
use rug::Integer;

use crate::error::GenerateError;

/// Number of bytes needed to hold a `bits`-bit candidate.
pub fn buffer_len(bits: u32) -> usize {
    (bits as usize).div_ceil(8)
}

/// Significant bits kept in the most-significant byte (1..=8).
fn top_byte_bits(bits: u32) -> u32 {
    match bits % 8 {
        0 => 8,
        b => b,
    }
}

/// Force the shaping invariants onto `bytes` in place and return the value.
///
/// `bytes` must be exactly `buffer_len(bits)` long and `bits >= 2`.
pub fn shape_candidate(bits: u32, bytes: &mut [u8]) -> Integer {
    debug_assert!(bits >= 2);
    debug_assert_eq!(bytes.len(), buffer_len(bits));

    let b = top_byte_bits(bits);
    bytes[0] &= ((1u16 << b) - 1) as u8;
    if b >= 2 {
        bytes[0] |= 3 << (b - 2);
    } else {
        // Only one significant bit in the top byte: the second high bit
        // lives at the top of the next byte.
        bytes[0] |= 1;
        if bytes.len() > 1 {
            bytes[1] |= 0x80;
        }
    }
    let last = bytes.len() - 1;
    bytes[last] |= 1;

    Integer::from_digits(&*bytes, Order::Msf)
}

/// Fill `buf` from `rng` and shape it. Entropy failure is returned as-is;
/// the caller must not retry.
pub fn draw_candidate<R: RngCore + ?Sized>(
    rng: &mut R,
    bits: u32,
    buf: &mut [u8],
) -> Result<Integer, GenerateError> {
    rng.try_fill_bytes(buf)?;
    Ok(shape_candidate(bits, buf))
}

/// True if `n` satisfies every shaping invariant for `bits`.
pub fn is_well_shaped(n: &Integer, bits: u32) -> bool {
    bits >= 2
        && n.significant_bits() == bits
        && n.is_odd()
        && n.get_bit(bits - 1)
        && n.get_bit(bits - 2)
}
