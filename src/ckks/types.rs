//! CKKS plaintext, ciphertext and key types.

use std::sync::Arc;

use crate::error::{err, Result};
use crate::math::Poly;
use crate::params::SchemeParameters;
use serde::{Deserialize, Serialize};

/// Encoded message polynomial at a given level and scale.
#[derive(Clone, Debug, PartialEq)]
pub struct Plaintext {
    /// Coefficient-domain polynomial over the moduli of `level`.
    pub poly: Poly,
    pub level: usize,
    pub scale: f64,
}

/// CKKS ciphertext (a, b) with b + a·s ≈ m.
///
/// Both polynomials are in coefficient domain over q_0..q_level. The scale
/// records the factor the message was multiplied by.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ciphertext {
    pub a: Poly,
    pub b: Poly,
    pub level: usize,
    pub scale: f64,
}

impl Ciphertext {
    /// Checks a ciphertext received over the wire against `params`.
    pub fn validate(&self, params: &SchemeParameters) -> Result<()> {
        if self.level > params.max_level() {
            return Err(err!(
                Protocol,
                "ciphertext level {} above maximum {}",
                self.level,
                params.max_level()
            ));
        }
        let moduli = params.level_moduli(self.level);
        let n = params.ring_dim();
        if !self.a.is_well_formed(n, moduli, false) || !self.b.is_well_formed(n, moduli, false) {
            return Err(err!(
                Protocol,
                "ciphertext polynomials do not match ring degree {} and level {}",
                n,
                self.level
            ));
        }
        if !(self.scale.is_finite() && self.scale >= 1.0) {
            return Err(err!(Protocol, "ciphertext scale {} is invalid", self.scale));
        }
        Ok(())
    }
}

/// Ternary secret over the full key basis, coefficient domain.
#[derive(Clone)]
pub struct SecretKey {
    pub(crate) poly: Poly,
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretKey").finish_non_exhaustive()
    }
}

/// Public encryption key (a, -a·s + e) over q_0..q_L, coefficient domain.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PublicKey {
    pub a: Poly,
    pub b: Poly,
}

/// One key-switching digit: (a_i, -a_i·s + e_i + P·g_i·s²), NTT domain over
/// the key basis. g_i is the CRT idempotent of q_i.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KeySwitchDigit {
    pub a: Poly,
    pub b: Poly,
}

/// Relinearization key: encryptions of s² under s, one digit per q_i.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelinearizationKey {
    pub digits: Vec<KeySwitchDigit>,
}

impl RelinearizationKey {
    /// Checks a key received over the wire against `params`.
    pub fn validate(&self, params: &SchemeParameters) -> Result<()> {
        let expected = params.q_moduli.len();
        if self.digits.len() != expected {
            return Err(err!(
                Protocol,
                "relinearization key has {} digits, expected {}",
                self.digits.len(),
                expected
            ));
        }
        let basis = params.key_basis();
        let n = params.ring_dim();
        for (i, digit) in self.digits.iter().enumerate() {
            if !digit.a.is_well_formed(n, &basis, true) || !digit.b.is_well_formed(n, &basis, true)
            {
                return Err(err!(Protocol, "relinearization digit {} is malformed", i));
            }
        }
        Ok(())
    }
}

/// Evaluation keys an evaluator needs. Cloning shares the key material.
#[derive(Clone, Debug)]
pub struct EvaluationKeySet {
    relinearization_key: Arc<RelinearizationKey>,
}

impl EvaluationKeySet {
    pub fn new(relinearization_key: RelinearizationKey) -> Self {
        Self {
            relinearization_key: Arc::new(relinearization_key),
        }
    }

    pub fn relinearization_key(&self) -> &RelinearizationKey {
        &self.relinearization_key
    }
}
