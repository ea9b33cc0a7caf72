//! Homomorphic operations on ciphertexts.
//!
//! # Key switching
//!
//! Relinearization turns the degree-two term d2 of a product into a pair
//! (y_a, y_b) with y_b + y_a·s ≈ d2·s². Each residue [d2]_{q_i}, centered, is
//! lifted to q_0..q_l, P and multiplied with digit i of the relinearization
//! key. The accumulated pair carries a factor P, which is removed by dividing
//! by P with rounding.

use std::sync::Arc;

use super::context::RingContext;
use super::encoder::Encoder;
use super::types::{Ciphertext, EvaluationKeySet, Plaintext};
use crate::error::{err, Result};
use crate::math::Poly;

/// Evaluates homomorphic operations. Cloning is cheap and shares the ring
/// tables and key material.
#[derive(Clone, Debug)]
pub struct Evaluator {
    ring: Arc<RingContext>,
    encoder: Encoder,
    keys: Option<EvaluationKeySet>,
}

impl Evaluator {
    /// Evaluator without evaluation keys; multiplication is unavailable.
    pub fn new(ring: Arc<RingContext>) -> Self {
        let encoder = Encoder::new(ring.clone());
        Self {
            ring,
            encoder,
            keys: None,
        }
    }

    /// Shallow copy bound to `keys`.
    pub fn with_keys(&self, keys: EvaluationKeySet) -> Self {
        Self {
            ring: self.ring.clone(),
            encoder: self.encoder.clone(),
            keys: Some(keys),
        }
    }

    /// ct - pt, slot-wise.
    pub fn sub_plaintext(&self, ct: &Ciphertext, pt: &Plaintext) -> Result<Ciphertext> {
        if pt.level != ct.level {
            return Err(err!(
                Evaluation,
                "plaintext level {} does not match ciphertext level {}",
                pt.level,
                ct.level
            ));
        }
        let mut out = ct.clone();
        out.b -= &pt.poly;
        Ok(out)
    }

    /// ct - values, slot-wise. `values` is encoded at the ciphertext's level
    /// and scale.
    pub fn sub_plain(&self, ct: &Ciphertext, values: &[f64]) -> Result<Ciphertext> {
        let pt = self.encoder.encode(values, ct.level, ct.scale)?;
        self.sub_plaintext(ct, &pt)
    }

    /// Product of two ciphertexts at the same level, relinearized back to
    /// degree one. The output scale is the product of the input scales.
    pub fn mul_relin(&self, lhs: &Ciphertext, rhs: &Ciphertext) -> Result<Ciphertext> {
        if lhs.level != rhs.level {
            return Err(err!(
                Evaluation,
                "operand levels differ: {} vs {}",
                lhs.level,
                rhs.level
            ));
        }
        let scale = lhs.scale * rhs.scale;
        if !scale.is_finite() {
            return Err(err!(Evaluation, "product scale overflows"));
        }

        let ntt = self.ring.ntt();
        let a1 = lhs.a.to_ntt_new(ntt);
        let b1 = lhs.b.to_ntt_new(ntt);
        let (a2, b2) = if std::ptr::eq(lhs, rhs) {
            (a1.clone(), b1.clone())
        } else {
            (rhs.a.to_ntt_new(ntt), rhs.b.to_ntt_new(ntt))
        };

        let mut d0 = b1.mul_ntt_domain(&b2, ntt);
        let mut d1 = a1.mul_ntt_domain(&b2, ntt);
        d1.mul_acc_ntt_domain(&a2, &b1, ntt);
        let mut d2 = a1.mul_ntt_domain(&a2, ntt);
        d0.from_ntt(ntt);
        d1.from_ntt(ntt);
        d2.from_ntt(ntt);

        let (ya, yb) = self.key_switch(&d2, lhs.level)?;

        Ok(Ciphertext {
            a: &d1 + &ya,
            b: &d0 + &yb,
            level: lhs.level,
            scale,
        })
    }

    /// Divides by the top prime q_l with rounding, dropping one level.
    pub fn rescale(&self, ct: &Ciphertext) -> Result<Ciphertext> {
        if ct.level == 0 {
            return Err(err!(Evaluation, "cannot rescale a level-0 ciphertext"));
        }
        let q_top = self.ring.params().q_moduli[ct.level];
        Ok(Ciphertext {
            a: ct.a.divide_round_by_last(),
            b: ct.b.divide_round_by_last(),
            level: ct.level - 1,
            scale: ct.scale / q_top as f64,
        })
    }

    fn key_switch(&self, d2: &Poly, level: usize) -> Result<(Poly, Poly)> {
        let keys = self
            .keys
            .as_ref()
            .ok_or_else(|| err!(Evaluation, "no relinearization key bound to evaluator"))?;
        let rlk = keys.relinearization_key();

        let ntt = self.ring.ntt();
        let n = self.ring.ring_dim();
        let extended = self.ring.extended_moduli(level);

        let mut acc_a = Poly::zero(n, &extended).to_ntt_new(ntt);
        let mut acc_b = acc_a.clone();

        for i in 0..=level {
            let digit = Poly::from_signed(&d2.centered_residue(i), &extended).to_ntt_new(ntt);
            let key = rlk
                .digits
                .get(i)
                .ok_or_else(|| err!(Evaluation, "relinearization key lacks digit {}", i))?;
            acc_a.mul_acc_ntt_domain(&digit, &key.a.restrict(&extended), ntt);
            acc_b.mul_acc_ntt_domain(&digit, &key.b.restrict(&extended), ntt);
        }

        acc_a.from_ntt(ntt);
        acc_b.from_ntt(ntt);
        Ok((acc_a.divide_round_by_last(), acc_b.divide_round_by_last()))
    }
}
