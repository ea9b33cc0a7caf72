//! Precomputed tables shared by every CKKS component of a parameter set.

use std::sync::Arc;

use crate::error::Result;
use crate::math::{NttContext, SpecialFft};
use crate::params::SchemeParameters;

/// NTT tables over the full key basis plus the slot FFT.
///
/// Built once per parameter set and shared behind an [`Arc`] by the encoder,
/// key generator, encryptor, decryptor and evaluator.
#[derive(Debug)]
pub struct RingContext {
    params: SchemeParameters,
    ntt: NttContext,
    fft: SpecialFft,
}

impl RingContext {
    /// Validates `params` and precomputes the tables.
    pub fn new(params: SchemeParameters) -> Result<Arc<Self>> {
        params.validate()?;
        let n = params.ring_dim();
        let ntt = NttContext::with_moduli(n, &params.key_basis());
        let fft = SpecialFft::new(n);
        tracing::debug!(
            ring_dim = n,
            levels = params.q_moduli.len(),
            "built CKKS ring context"
        );
        Ok(Arc::new(Self { params, ntt, fft }))
    }

    pub fn params(&self) -> &SchemeParameters {
        &self.params
    }

    pub fn ntt(&self) -> &NttContext {
        &self.ntt
    }

    pub fn fft(&self) -> &SpecialFft {
        &self.fft
    }

    pub fn ring_dim(&self) -> usize {
        self.params.ring_dim()
    }

    /// Ciphertext moduli at `level` followed by P.
    pub fn extended_moduli(&self, level: usize) -> Vec<u64> {
        let mut moduli = self.params.level_moduli(level).to_vec();
        moduli.push(self.params.p_modulus);
        moduli
    }
}
