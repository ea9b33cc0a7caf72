//! CKKS parameter sets.
//!
//! A [`ParametersLiteral`] names bit sizes; [`SchemeParameters`] holds the
//! concrete primes generated from it. Both client and server must run with
//! the same `SchemeParameters`, so the concrete primes travel on the wire and
//! are compared for equality.

use crate::error::{err, Result};
use crate::math::primes::{ntt_primes, MAX_PRIME_BITS};
use crate::math::ModQ;
use serde::{Deserialize, Serialize};

/// Smallest supported log2 of the ring degree.
pub const MIN_LOG_N: u32 = 3;
/// Largest supported log2 of the ring degree.
pub const MAX_LOG_N: u32 = 17;
/// Default Gaussian standard deviation for error terms.
pub const DEFAULT_SIGMA: f64 = crate::math::gaussian::DEFAULT_SIGMA;

/// Bit-size description of a parameter set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParametersLiteral {
    /// log2 of the ring degree N
    pub log_n: u32,
    /// Bit size of each ciphertext prime q_0..q_L
    pub log_q: Vec<u32>,
    /// Bit size of the auxiliary key-switching prime
    pub log_p: Vec<u32>,
    /// log2 of the default encoding scale
    pub log_default_scale: u32,
}

impl ParametersLiteral {
    /// Production preset: N = 2^14, eight ciphertext primes, scale 2^45.
    pub fn securesight() -> Self {
        Self {
            log_n: 14,
            log_q: vec![60, 50, 50, 50, 50, 50, 50, 50],
            log_p: vec![61],
            log_default_scale: 45,
        }
    }

    /// Small preset for tests and local experiments; not secure.
    pub fn toy(log_n: u32) -> Self {
        Self {
            log_n,
            log_q: vec![60, 40, 40],
            log_p: vec![61],
            log_default_scale: 40,
        }
    }
}

impl Default for ParametersLiteral {
    fn default() -> Self {
        Self::securesight()
    }
}

/// Concrete CKKS parameters shared by client and server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemeParameters {
    /// log2 of the ring degree N
    pub log_n: u32,
    /// Ciphertext primes q_0..q_L; a fresh ciphertext has level L
    pub q_moduli: Vec<u64>,
    /// Auxiliary prime P used only inside key switching
    pub p_modulus: u64,
    /// log2 of the default encoding scale
    pub log_default_scale: u32,
    /// Standard deviation of error terms
    pub sigma: f64,
}

impl SchemeParameters {
    /// Generates concrete primes for `literal` and validates the result.
    pub fn from_literal(literal: &ParametersLiteral) -> Result<Self> {
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&literal.log_n) {
            return Err(err!(
                Configuration,
                "log_n {} outside {}..={}",
                literal.log_n,
                MIN_LOG_N,
                MAX_LOG_N
            ));
        }
        if literal.log_p.len() != 1 {
            return Err(err!(
                Configuration,
                "exactly one auxiliary prime is supported, got {}",
                literal.log_p.len()
            ));
        }

        let n = 1usize << literal.log_n;
        let q_moduli = ntt_primes(&literal.log_q, n, &[])?;
        let p = ntt_primes(&literal.log_p, n, &q_moduli)?;

        let params = Self {
            log_n: literal.log_n,
            q_moduli,
            p_modulus: p[0],
            log_default_scale: literal.log_default_scale,
            sigma: DEFAULT_SIGMA,
        };
        params.validate()?;
        Ok(params)
    }

    /// Ring degree N
    pub fn ring_dim(&self) -> usize {
        1 << self.log_n
    }

    /// Number of complex slots, N/2
    pub fn max_slots(&self) -> usize {
        self.ring_dim() / 2
    }

    /// Level of a fresh ciphertext, L
    pub fn max_level(&self) -> usize {
        self.q_moduli.len().saturating_sub(1)
    }

    /// Default encoding scale, 2^log_default_scale
    pub fn default_scale(&self) -> f64 {
        2f64.powi(self.log_default_scale as i32)
    }

    /// Ciphertext primes active at `level`
    pub fn level_moduli(&self, level: usize) -> &[u64] {
        &self.q_moduli[..=level]
    }

    /// Full key basis q_0..q_L, P
    pub fn key_basis(&self) -> Vec<u64> {
        let mut basis = self.q_moduli.clone();
        basis.push(self.p_modulus);
        basis
    }

    /// Checks every structural requirement the backend relies on.
    pub fn validate(&self) -> Result<()> {
        if !(MIN_LOG_N..=MAX_LOG_N).contains(&self.log_n) {
            return Err(err!(Configuration, "log_n {} out of range", self.log_n));
        }
        if self.q_moduli.is_empty() {
            return Err(err!(Configuration, "at least one ciphertext prime required"));
        }

        let two_n = 2 * self.ring_dim() as u64;
        let basis = self.key_basis();
        for (i, &q) in basis.iter().enumerate() {
            if q >= 1u64 << MAX_PRIME_BITS {
                return Err(err!(Configuration, "modulus {} exceeds {} bits", q, MAX_PRIME_BITS));
            }
            if q % two_n != 1 || !ModQ::is_prime(q) {
                return Err(err!(
                    Configuration,
                    "modulus {} is not an NTT-friendly prime for N = {}",
                    q,
                    self.ring_dim()
                ));
            }
            if basis[..i].contains(&q) {
                return Err(err!(Configuration, "modulus {} repeated", q));
            }
        }

        let q0_bits = 64 - self.q_moduli[0].leading_zeros();
        if self.log_default_scale == 0 || self.log_default_scale >= q0_bits {
            return Err(err!(
                Configuration,
                "default scale 2^{} must be positive and below q_0 ({} bits)",
                self.log_default_scale,
                q0_bits
            ));
        }
        if !(self.sigma.is_finite() && self.sigma > 0.0) {
            return Err(err!(Configuration, "sigma must be positive, got {}", self.sigma));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_toy_params_valid() {
        let params = SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap();
        assert_eq!(params.ring_dim(), 32);
        assert_eq!(params.max_slots(), 16);
        assert_eq!(params.max_level(), 2);
        assert_eq!(params.key_basis().len(), 4);
        assert_eq!(params.level_moduli(1), &params.q_moduli[..2]);
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = SchemeParameters::from_literal(&ParametersLiteral::toy(6)).unwrap();
        let b = SchemeParameters::from_literal(&ParametersLiteral::toy(6)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_rejects_bad_literals() {
        let mut literal = ParametersLiteral::toy(5);
        literal.log_p = vec![61, 61];
        assert!(SchemeParameters::from_literal(&literal).is_err());

        let mut literal = ParametersLiteral::toy(5);
        literal.log_default_scale = 60;
        assert!(SchemeParameters::from_literal(&literal).is_err());

        assert!(SchemeParameters::from_literal(&ParametersLiteral::toy(2)).is_err());
    }

    #[test]
    fn test_validate_catches_tampering() {
        let mut params = SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap();
        params.q_moduli[1] += 2;
        assert!(params.validate().is_err());

        let mut params = SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap();
        params.p_modulus = params.q_moduli[0];
        assert!(params.validate().is_err());
    }
}
