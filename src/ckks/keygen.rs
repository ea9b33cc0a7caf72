//! Key generation.

use std::sync::Arc;

use super::context::RingContext;
use super::types::{KeySwitchDigit, PublicKey, RelinearizationKey, SecretKey};
use crate::math::{GaussianSampler, ModQ, Poly};

/// Generates a secret key and the keys derived from it.
pub struct KeyGenerator {
    ring: Arc<RingContext>,
    sampler: GaussianSampler,
}

impl KeyGenerator {
    /// Key generator drawing randomness from OS entropy.
    pub fn new(ring: Arc<RingContext>) -> Self {
        let sampler = GaussianSampler::new(ring.params().sigma);
        Self { ring, sampler }
    }

    /// Key generator with a fixed seed, for reproducible keys in tests.
    pub fn with_seed(ring: Arc<RingContext>, seed: u64) -> Self {
        let sampler = GaussianSampler::with_seed(ring.params().sigma, seed);
        Self { ring, sampler }
    }

    /// Ternary secret s over the key basis.
    pub fn gen_secret_key(&mut self) -> SecretKey {
        let basis = self.ring.params().key_basis();
        SecretKey {
            poly: Poly::sample_ternary(self.ring.ring_dim(), &basis, &mut self.sampler),
        }
    }

    /// Public key (a, -a·s + e) at the top level.
    pub fn gen_public_key(&mut self, sk: &SecretKey) -> PublicKey {
        let params = self.ring.params();
        let ntt = self.ring.ntt();
        let n = self.ring.ring_dim();
        let moduli = params.level_moduli(params.max_level());

        let a = Poly::sample_uniform_ntt(n, moduli, &mut self.sampler);
        let e = Poly::sample_gaussian(n, moduli, &mut self.sampler).to_ntt_new(ntt);
        let s = sk.poly.restrict(moduli).to_ntt_new(ntt);

        let mut b = &e - &a.mul_ntt_domain(&s, ntt);
        b.from_ntt(ntt);
        let mut a = a;
        a.from_ntt(ntt);

        PublicKey { a, b }
    }

    /// Relinearization key: for each q_i, (a_i, -a_i·s + e_i + P·g_i·s²) over
    /// the key basis, where g_i is 1 modulo q_i and 0 modulo every other
    /// prime. Residue i of P·g_i·s² is therefore (P mod q_i)·s² and every
    /// other residue is zero.
    pub fn gen_relinearization_key(&mut self, sk: &SecretKey) -> RelinearizationKey {
        let params = self.ring.params();
        let ntt = self.ring.ntt();
        let n = self.ring.ring_dim();
        let basis = params.key_basis();
        let p = params.p_modulus;

        let s = sk.poly.to_ntt_new(ntt);
        let s_squared = s.mul_ntt_domain(&s, ntt);

        let digits = params
            .q_moduli
            .iter()
            .enumerate()
            .map(|(i, &qi)| {
                let a = Poly::sample_uniform_ntt(n, &basis, &mut self.sampler);
                let e = Poly::sample_gaussian(n, &basis, &mut self.sampler).to_ntt_new(ntt);
                let mut b = &e - &a.mul_ntt_domain(&s, ntt);

                let p_mod_qi = p % qi;
                let gadget = s_squared.residue(i);
                for (bj, &g) in b.residue_mut(i).iter_mut().zip(gadget) {
                    *bj = ModQ::add(*bj, ModQ::mul(g, p_mod_qi, qi), qi);
                }

                KeySwitchDigit { a, b }
            })
            .collect();

        RelinearizationKey { digits }
    }
}
