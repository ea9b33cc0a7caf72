//! NTT-friendly prime generation.

use super::modular::ModQ;
use crate::error::{Error, Result};

/// Smallest bit size accepted for a generated prime.
pub const MIN_PRIME_BITS: u32 = 20;
/// Largest bit size accepted; keeps Montgomery products inside 128 bits.
pub const MAX_PRIME_BITS: u32 = 61;

/// Generates one prime per entry of `bit_sizes`, each ≡ 1 (mod 2n) and
/// strictly below 2^bits.
///
/// Candidates are scanned downward from the largest admissible value, so the
/// output is deterministic. Primes already emitted and those in `exclude` are
/// skipped, which keeps the whole basis pairwise distinct.
pub fn ntt_primes(bit_sizes: &[u32], n: usize, exclude: &[u64]) -> Result<Vec<u64>> {
    if !n.is_power_of_two() || n < 2 {
        return Err(Error::Configuration(format!(
            "ring dimension {n} is not a power of two"
        )));
    }
    let m = 2 * n as u64;
    let mut taken: Vec<u64> = exclude.to_vec();
    let mut primes = Vec::with_capacity(bit_sizes.len());

    for &bits in bit_sizes {
        if !(MIN_PRIME_BITS..=MAX_PRIME_BITS).contains(&bits) {
            return Err(Error::Configuration(format!(
                "prime size {bits} bits outside {MIN_PRIME_BITS}..={MAX_PRIME_BITS}"
            )));
        }
        let upper = 1u64 << bits;
        let lower = 1u64 << (bits - 1);
        if m >= lower {
            return Err(Error::Configuration(format!(
                "prime size {bits} bits too small for ring dimension {n}"
            )));
        }

        let mut candidate = (upper - 1) / m * m + 1;
        let prime = loop {
            if candidate <= lower {
                return Err(Error::Configuration(format!(
                    "ran out of {bits}-bit primes ≡ 1 mod {m}"
                )));
            }
            if !taken.contains(&candidate) && ModQ::is_prime(candidate) {
                break candidate;
            }
            candidate -= m;
        };

        taken.push(prime);
        primes.push(prime);
    }

    Ok(primes)
}
