//! Client-held key material and query encryption.

use std::sync::Arc;
use std::time::Instant;

use tracing::debug;

use crate::ckks::{
    Ciphertext, Decryptor, Encoder, Encryptor, EvaluationKeySet, Evaluator, KeyGenerator,
    RingContext,
};
use crate::error::Result;
use crate::layout::SlotLayout;
use crate::params::SchemeParameters;
use crate::protocol::PublicContext;

/// Secret key and everything derived from it for one client session.
///
/// Never serialized. Only [`export_public_context`] produces data that
/// leaves the client.
///
/// [`export_public_context`]: SecretContext::export_public_context
pub struct SecretContext {
    pub(super) ring: Arc<RingContext>,
    pub(super) layout: SlotLayout,
    pub(super) encoder: Encoder,
    pub(super) decryptor: Decryptor,
    encryptor: Encryptor,
    evaluation_keys: EvaluationKeySet,
    evaluator: Evaluator,
}

impl SecretContext {
    /// Generates fresh keys from OS entropy for embeddings of `dimension`.
    ///
    /// Fails with a configuration error if the parameters are invalid or an
    /// embedding does not fit into one ciphertext.
    pub fn new(params: SchemeParameters, dimension: usize) -> Result<Self> {
        let ring = RingContext::new(params)?;
        let keygen = KeyGenerator::new(ring.clone());
        Self::build(ring, dimension, keygen, None)
    }

    /// Deterministic keys and encryption randomness, for tests and
    /// reproducible benchmarks.
    pub fn with_seed(params: SchemeParameters, dimension: usize, seed: u64) -> Result<Self> {
        let ring = RingContext::new(params)?;
        let keygen = KeyGenerator::with_seed(ring.clone(), seed);
        Self::build(ring, dimension, keygen, Some(seed.wrapping_add(1)))
    }

    fn build(
        ring: Arc<RingContext>,
        dimension: usize,
        mut keygen: KeyGenerator,
        encryption_seed: Option<u64>,
    ) -> Result<Self> {
        let layout = SlotLayout::new(dimension, ring.params().max_slots())?;

        let started = Instant::now();
        let secret_key = keygen.gen_secret_key();
        let public_key = keygen.gen_public_key(&secret_key);
        let evaluation_keys = EvaluationKeySet::new(keygen.gen_relinearization_key(&secret_key));
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            "generated client keys"
        );

        let encryptor = match encryption_seed {
            Some(seed) => Encryptor::with_seed(ring.clone(), public_key, seed),
            None => Encryptor::new(ring.clone(), public_key),
        };

        Ok(Self {
            layout,
            encoder: Encoder::new(ring.clone()),
            decryptor: Decryptor::new(ring.clone(), secret_key),
            encryptor,
            evaluator: Evaluator::new(ring.clone()).with_keys(evaluation_keys.clone()),
            evaluation_keys,
            ring,
        })
    }

    pub fn params(&self) -> &SchemeParameters {
        self.ring.params()
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    /// Evaluator bound to this session's evaluation keys.
    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    /// Encrypts `vector` replicated into every slot segment, at the top
    /// level and default scale.
    pub fn encrypt(&mut self, vector: &[f64]) -> Result<Ciphertext> {
        let started = Instant::now();
        let replicated = self.layout.replicate(vector)?;
        let params = self.ring.params();
        let pt = self
            .encoder
            .encode(&replicated, params.max_level(), params.default_scale())?;
        let ct = self.encryptor.encrypt(&pt);
        debug!(
            elapsed_us = started.elapsed().as_micros() as u64,
            "encrypted query"
        );
        Ok(ct)
    }

    /// Bundles parameters, the relinearization key and `queries` for the
    /// server.
    pub fn export_public_context(&self, queries: Vec<Ciphertext>) -> PublicContext {
        PublicContext {
            params: self.params().clone(),
            relinearization_key: self.evaluation_keys.relinearization_key().clone(),
            queries,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::params::ParametersLiteral;

    fn params() -> SchemeParameters {
        SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap()
    }

    #[test]
    fn test_encrypt_replicates_into_every_segment() {
        let mut ctx = SecretContext::with_seed(params(), 4, 1).unwrap();
        let ct = ctx.encrypt(&[1.0, -2.0, 0.5, 3.0]).unwrap();
        assert_eq!(ct.level, params().max_level());

        let slots = ctx.decrypt_slots(&ct).unwrap();
        for segment in 0..4 {
            let got = &slots[ctx.layout().segment(segment)];
            for (g, w) in got.iter().zip([1.0, -2.0, 0.5, 3.0]) {
                assert!((g - w).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_wrong_length_embedding() {
        let mut ctx = SecretContext::with_seed(params(), 4, 1).unwrap();
        let err = ctx.encrypt(&[1.0, 2.0]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DataFormat);
    }

    #[test]
    fn test_dimension_larger_than_slots() {
        let err = SecretContext::with_seed(params(), 17, 1).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_local_evaluator_matches_plaintext() {
        let mut ctx = SecretContext::with_seed(params(), 4, 2).unwrap();
        let ct = ctx.encrypt(&[3.0, 1.0, 0.0, -1.0]).unwrap();
        let target = [1.0, 1.0, 1.0, 1.0].repeat(4);

        let evaluator = ctx.evaluator();
        let diff = evaluator.sub_plain(&ct, &target).unwrap();
        let squared = evaluator
            .rescale(&evaluator.mul_relin(&diff, &diff).unwrap())
            .unwrap();

        let slots = ctx.decrypt_slots(&squared).unwrap();
        for (g, w) in slots[..4].iter().zip([4.0, 0.0, 1.0, 4.0]) {
            assert!((g - w).abs() < 1e-4, "{g} != {w}");
        }
    }

    #[test]
    fn test_export_contains_queries_and_key() {
        let mut ctx = SecretContext::with_seed(params(), 4, 3).unwrap();
        let q = ctx.encrypt(&[0.0; 4]).unwrap();
        let public = ctx.export_public_context(vec![q.clone()]);
        assert_eq!(public.queries, vec![q]);
        assert_eq!(public.relinearization_key.digits.len(), 3);
        assert!(public.validate(ctx.params()).is_ok());
    }
}
