//! Slot encoding: real vectors to plaintext polynomials and back.

use std::sync::Arc;

use rustfft::num_complex::Complex64;

use super::context::RingContext;
use super::types::Plaintext;
use crate::error::{err, Result};
use crate::math::{GarnerBasis, Poly};

/// Scaled coefficients must stay below this magnitude to fit in `i128`.
const MAX_SCALED_MAGNITUDE: f64 = 1.7e38;

/// Encodes up to N/2 real values into the slots of a plaintext.
#[derive(Debug, Clone)]
pub struct Encoder {
    ring: Arc<RingContext>,
}

impl Encoder {
    pub fn new(ring: Arc<RingContext>) -> Self {
        Self { ring }
    }

    /// Encodes `values` (zero-padded to N/2 slots) at `level` and `scale`.
    pub fn encode(&self, values: &[f64], level: usize, scale: f64) -> Result<Plaintext> {
        let params = self.ring.params();
        let slots = params.max_slots();
        if values.len() > slots {
            return Err(err!(
                Evaluation,
                "{} values exceed the {} available slots",
                values.len(),
                slots
            ));
        }
        if level > params.max_level() {
            return Err(err!(Evaluation, "level {} above maximum", level));
        }
        if !(scale.is_finite() && scale > 0.0) {
            return Err(err!(Evaluation, "invalid encoding scale {}", scale));
        }
        if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
            return Err(err!(Evaluation, "cannot encode non-finite value {}", bad));
        }

        let mut vals = vec![Complex64::new(0.0, 0.0); slots];
        for (slot, &v) in vals.iter_mut().zip(values) {
            slot.re = v;
        }
        self.ring.fft().inverse(&mut vals);

        let mut coeffs = vec![0i128; params.ring_dim()];
        for (i, v) in vals.iter().enumerate() {
            let re = (v.re * scale).round();
            let im = (v.im * scale).round();
            if re.abs() >= MAX_SCALED_MAGNITUDE || im.abs() >= MAX_SCALED_MAGNITUDE {
                return Err(err!(Evaluation, "scaled coefficient overflows at scale {}", scale));
            }
            coeffs[i] = re as i128;
            coeffs[i + slots] = im as i128;
        }

        Ok(Plaintext {
            poly: Poly::from_i128(&coeffs, params.level_moduli(level)),
            level,
            scale,
        })
    }

    /// Decodes every slot of `pt` back to real values.
    pub fn decode(&self, pt: &Plaintext) -> Vec<f64> {
        let slots = self.ring.params().max_slots();
        let mut poly = pt.poly.clone();
        poly.from_ntt(self.ring.ntt());

        let basis = GarnerBasis::new(poly.moduli());
        let mut residues = vec![0u64; poly.residue_count()];
        let mut coeff_at = |k: usize| {
            for (r, slot) in residues.iter_mut().enumerate() {
                *slot = poly.residue(r)[k];
            }
            basis.reconstruct_centered(&residues) / pt.scale
        };

        let mut vals: Vec<Complex64> = (0..slots)
            .map(|i| Complex64::new(coeff_at(i), coeff_at(i + slots)))
            .collect();
        self.ring.fft().forward(&mut vals);

        vals.into_iter().map(|v| v.re).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ParametersLiteral, SchemeParameters};

    fn encoder() -> Encoder {
        let params = SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap();
        Encoder::new(RingContext::new(params).unwrap())
    }

    #[test]
    fn test_encode_decode_recovers_values() {
        let encoder = encoder();
        let values: Vec<f64> = (0..16).map(|i| i as f64 * 0.25 - 1.5).collect();
        let pt = encoder.encode(&values, 2, 2f64.powi(40)).unwrap();
        let decoded = encoder.decode(&pt);
        for (got, want) in decoded.iter().zip(&values) {
            assert!((got - want).abs() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let encoder = encoder();
        let pt = encoder.encode(&[3.0, -2.0], 1, 2f64.powi(30)).unwrap();
        let decoded = encoder.decode(&pt);
        assert!((decoded[0] - 3.0).abs() < 1e-6);
        assert!((decoded[1] + 2.0).abs() < 1e-6);
        assert!(decoded[2..].iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_rejects_bad_input() {
        let encoder = encoder();
        assert!(encoder.encode(&[0.0; 17], 0, 1e9).is_err());
        assert!(encoder.encode(&[f64::NAN], 0, 1e9).is_err());
        assert!(encoder.encode(&[1.0], 3, 1e9).is_err());
    }
}
