//! Public-key encryption and secret-key decryption.
//!
//! Encryption samples ternary u and Gaussian e0, e1 and outputs
//! (pk.a·u + e1, pk.b·u + e0 + m). Decryption returns b + a·s.

use std::sync::Arc;

use super::context::RingContext;
use super::types::{Ciphertext, Plaintext, PublicKey, SecretKey};
use crate::math::{GaussianSampler, Poly};

/// Encrypts plaintexts under a public key.
pub struct Encryptor {
    ring: Arc<RingContext>,
    public_key: PublicKey,
    sampler: GaussianSampler,
}

impl Encryptor {
    pub fn new(ring: Arc<RingContext>, public_key: PublicKey) -> Self {
        let sampler = GaussianSampler::new(ring.params().sigma);
        Self {
            ring,
            public_key,
            sampler,
        }
    }

    /// Encryptor with a fixed seed for the encryption randomness.
    pub fn with_seed(ring: Arc<RingContext>, public_key: PublicKey, seed: u64) -> Self {
        let sampler = GaussianSampler::with_seed(ring.params().sigma, seed);
        Self {
            ring,
            public_key,
            sampler,
        }
    }

    /// Encrypts `pt` at its own level and scale.
    pub fn encrypt(&mut self, pt: &Plaintext) -> Ciphertext {
        let ntt = self.ring.ntt();
        let n = self.ring.ring_dim();
        let moduli = pt.poly.moduli();

        let u = Poly::sample_ternary(n, moduli, &mut self.sampler).to_ntt_new(ntt);
        let e0 = Poly::sample_gaussian(n, moduli, &mut self.sampler);
        let e1 = Poly::sample_gaussian(n, moduli, &mut self.sampler);

        let pk_a = self.public_key.a.restrict(moduli).to_ntt_new(ntt);
        let pk_b = self.public_key.b.restrict(moduli).to_ntt_new(ntt);

        let mut a = pk_a.mul_ntt_domain(&u, ntt);
        a.from_ntt(ntt);
        a += &e1;

        let mut b = pk_b.mul_ntt_domain(&u, ntt);
        b.from_ntt(ntt);
        b += &e0;
        b += &pt.poly;

        Ciphertext {
            a,
            b,
            level: pt.level,
            scale: pt.scale,
        }
    }
}

/// Decrypts ciphertexts with the secret key.
pub struct Decryptor {
    ring: Arc<RingContext>,
    secret_key: SecretKey,
}

impl Decryptor {
    pub fn new(ring: Arc<RingContext>, secret_key: SecretKey) -> Self {
        Self { ring, secret_key }
    }

    /// Computes b + a·s over the ciphertext's moduli.
    pub fn decrypt(&self, ct: &Ciphertext) -> Plaintext {
        let ntt = self.ring.ntt();
        let moduli = ct.a.moduli();

        let s = self.secret_key.poly.restrict(moduli).to_ntt_new(ntt);
        let mut a_s = ct.a.to_ntt_new(ntt).mul_ntt_domain(&s, ntt);
        a_s.from_ntt(ntt);

        Plaintext {
            poly: &ct.b + &a_s,
            level: ct.level,
            scale: ct.scale,
        }
    }
}
