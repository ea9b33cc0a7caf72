//! Polynomials over Z_Q[X]/(X^N + 1) in residue number system form.
//!
//! Q is a product of word-sized primes q_0 · q_1 · ... and a polynomial is
//! stored as one length-N residue vector per prime, residue-major. All
//! residues share the same domain: coefficient or NTT.
//!
//! # Example
//!
//! ```
//! use securesight::math::{NttContext, Poly};
//! use securesight::math::primes::ntt_primes;
//!
//! let moduli = ntt_primes(&[50, 40], 16, &[]).unwrap();
//! let ctx = NttContext::with_moduli(16, &moduli);
//!
//! let a = Poly::from_signed(&[1; 16], &moduli);
//! let mut b = a.clone();
//! b.to_ntt(&ctx);
//! b.from_ntt(&ctx);
//! assert_eq!(a, b);
//! ```

use super::gaussian::GaussianSampler;
use super::modular::ModQ;
use super::ntt::NttContext;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Neg, Sub, SubAssign};

/// RNS polynomial.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Poly {
    /// Ring dimension N.
    n: usize,
    /// One prime per residue, in storage order.
    moduli: Vec<u64>,
    /// `moduli.len() * n` values, residue `i` at `i * n..(i + 1) * n`.
    coeffs: Vec<u64>,
    /// Whether the residues hold NTT evaluations.
    is_ntt: bool,
}

impl Poly {
    /// Zero polynomial in coefficient domain.
    pub fn zero(n: usize, moduli: &[u64]) -> Self {
        Self {
            n,
            moduli: moduli.to_vec(),
            coeffs: vec![0; n * moduli.len()],
            is_ntt: false,
        }
    }

    /// Lifts small signed coefficients into every residue.
    pub fn from_signed(values: &[i64], moduli: &[u64]) -> Self {
        let coeffs = moduli
            .iter()
            .flat_map(|&q| values.iter().map(move |&v| ModQ::from_signed(v, q)))
            .collect();
        Self {
            n: values.len(),
            moduli: moduli.to_vec(),
            coeffs,
            is_ntt: false,
        }
    }

    /// Lifts wide signed coefficients into every residue.
    pub fn from_i128(values: &[i128], moduli: &[u64]) -> Self {
        let coeffs = moduli
            .iter()
            .flat_map(|&q| values.iter().map(move |&v| ModQ::from_i128(v, q)))
            .collect();
        Self {
            n: values.len(),
            moduli: moduli.to_vec(),
            coeffs,
            is_ntt: false,
        }
    }

    /// Polynomial with discrete Gaussian coefficients.
    pub fn sample_gaussian(n: usize, moduli: &[u64], sampler: &mut GaussianSampler) -> Self {
        Self::from_signed(&sampler.sample_vec(n), moduli)
    }

    /// Polynomial with coefficients uniform in {-1, 0, 1}.
    pub fn sample_ternary(n: usize, moduli: &[u64], sampler: &mut GaussianSampler) -> Self {
        Self::from_signed(&sampler.sample_ternary_vec(n), moduli)
    }

    /// Uniformly random polynomial modulo Q.
    ///
    /// Independent uniform residues are uniform modulo the product, so the
    /// result may be flagged as either domain; it is returned in NTT domain
    /// to save a transform when used as the random half of a key.
    pub fn sample_uniform_ntt(n: usize, moduli: &[u64], sampler: &mut GaussianSampler) -> Self {
        let coeffs = moduli
            .iter()
            .flat_map(|&q| sampler.sample_uniform_vec(n, q))
            .collect();
        Self {
            n,
            moduli: moduli.to_vec(),
            coeffs,
            is_ntt: true,
        }
    }

    /// Ring dimension N.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Residue moduli in storage order.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Number of residues.
    pub fn residue_count(&self) -> usize {
        self.moduli.len()
    }

    /// Check if in NTT domain
    pub fn is_ntt(&self) -> bool {
        self.is_ntt
    }

    /// Residue `i`.
    pub fn residue(&self, i: usize) -> &[u64] {
        &self.coeffs[i * self.n..(i + 1) * self.n]
    }

    /// Mutable residue `i`.
    pub fn residue_mut(&mut self, i: usize) -> &mut [u64] {
        &mut self.coeffs[i * self.n..(i + 1) * self.n]
    }

    /// Residue `i` as balanced integers in (-q_i/2, q_i/2].
    pub fn centered_residue(&self, i: usize) -> Vec<i64> {
        let q = self.moduli[i];
        self.residue(i)
            .iter()
            .map(|&c| ModQ::to_signed(c, q))
            .collect()
    }

    /// Whether the layout matches `n` and `moduli`, every value is reduced,
    /// and the domain flag equals `ntt`. Used to vet deserialized input.
    pub fn is_well_formed(&self, n: usize, moduli: &[u64], ntt: bool) -> bool {
        self.n == n
            && self.moduli == moduli
            && self.is_ntt == ntt
            && self.coeffs.len() == n * moduli.len()
            && self
                .coeffs
                .chunks(n.max(1))
                .zip(&self.moduli)
                .all(|(residue, &q)| residue.iter().all(|&c| c < q))
    }

    /// Convert to NTT domain
    pub fn to_ntt(&mut self, ctx: &NttContext) {
        if self.is_ntt {
            return;
        }
        for i in 0..self.moduli.len() {
            let idx = Self::table_index(ctx, self.moduli[i]);
            let n = self.n;
            ctx.forward_residue(&mut self.coeffs[i * n..(i + 1) * n], idx);
        }
        self.is_ntt = true;
    }

    /// Convert from NTT domain to coefficient domain
    pub fn from_ntt(&mut self, ctx: &NttContext) {
        if !self.is_ntt {
            return;
        }
        for i in 0..self.moduli.len() {
            let idx = Self::table_index(ctx, self.moduli[i]);
            let n = self.n;
            ctx.inverse_residue(&mut self.coeffs[i * n..(i + 1) * n], idx);
        }
        self.is_ntt = false;
    }

    /// Copy in NTT domain
    pub fn to_ntt_new(&self, ctx: &NttContext) -> Self {
        let mut result = self.clone();
        result.to_ntt(ctx);
        result
    }

    /// Product of two NTT-domain polynomials over the same basis.
    pub fn mul_ntt_domain(&self, other: &Self, ctx: &NttContext) -> Self {
        let mut result = Self {
            n: self.n,
            moduli: self.moduli.clone(),
            coeffs: vec![0; self.coeffs.len()],
            is_ntt: true,
        };
        result.mul_acc_ntt_domain(self, other, ctx);
        result
    }

    /// In-place multiply-accumulate in NTT domain: self += a * b
    pub fn mul_acc_ntt_domain(&mut self, a: &Self, b: &Self, ctx: &NttContext) {
        assert!(
            self.is_ntt && a.is_ntt && b.is_ntt,
            "all polynomials must be in NTT domain"
        );
        assert_eq!(self.moduli, a.moduli, "moduli must match");
        assert_eq!(self.moduli, b.moduli, "moduli must match");

        let n = self.n;
        for i in 0..self.moduli.len() {
            let idx = Self::table_index(ctx, self.moduli[i]);
            let range = i * n..(i + 1) * n;
            ctx.mul_acc_residue(
                &mut self.coeffs[range.clone()],
                &a.coeffs[range.clone()],
                &b.coeffs[range],
                idx,
            );
        }
    }

    /// Copy holding only the residues for `moduli`, in that order.
    ///
    /// # Panics
    ///
    /// Panics if some requested modulus is absent.
    pub fn restrict(&self, moduli: &[u64]) -> Self {
        let mut coeffs = Vec::with_capacity(moduli.len() * self.n);
        for &q in moduli {
            let i = match self.moduli.iter().position(|&m| m == q) {
                Some(i) => i,
                None => panic!("modulus {q} not present in polynomial"),
            };
            coeffs.extend_from_slice(self.residue(i));
        }
        Self {
            n: self.n,
            moduli: moduli.to_vec(),
            coeffs,
            is_ntt: self.is_ntt,
        }
    }

    /// Divides by the last modulus q_last with rounding and drops its residue:
    /// y_j = (x_j - [x]_{q_last}) · q_last^(-1) mod q_j, with the last residue
    /// taken in balanced form.
    ///
    /// Both rescaling and the final step of key switching have this shape.
    /// The polynomial must be in coefficient domain and have at least two
    /// residues.
    pub fn divide_round_by_last(&self) -> Self {
        assert!(!self.is_ntt, "rounding division needs coefficient domain");
        assert!(self.moduli.len() >= 2, "need a residue to divide by");

        let last = self.moduli.len() - 1;
        let q_last = self.moduli[last];
        let centered_last = self.centered_residue(last);
        let kept = &self.moduli[..last];

        let mut coeffs = Vec::with_capacity(kept.len() * self.n);
        for (j, &qj) in kept.iter().enumerate() {
            let inv = match ModQ::inverse(q_last % qj, qj) {
                Some(inv) => inv,
                None => panic!("moduli {q_last} and {qj} are not coprime"),
            };
            coeffs.extend(self.residue(j).iter().zip(&centered_last).map(|(&x, &r)| {
                let diff = ModQ::sub(x, ModQ::from_signed(r, qj), qj);
                ModQ::mul(diff, inv, qj)
            }));
        }

        Self {
            n: self.n,
            moduli: kept.to_vec(),
            coeffs,
            is_ntt: false,
        }
    }

    fn table_index(ctx: &NttContext, q: u64) -> usize {
        match ctx.position(q) {
            Some(idx) => idx,
            None => panic!("modulus {q} not in NTT context"),
        }
    }

    fn zip_with(&self, rhs: &Self, op: impl Fn(u64, u64, u64) -> u64) -> Self {
        assert_eq!(self.moduli, rhs.moduli, "moduli must match");
        assert_eq!(self.is_ntt, rhs.is_ntt, "NTT domains must match");

        let n = self.n.max(1);
        let coeffs = self
            .coeffs
            .chunks(n)
            .zip(rhs.coeffs.chunks(n))
            .zip(&self.moduli)
            .flat_map(|((a, b), &q)| {
                let op = &op;
                a.iter().zip(b).map(move |(&x, &y)| op(x, y, q))
            })
            .collect();

        Self {
            n: self.n,
            moduli: self.moduli.clone(),
            coeffs,
            is_ntt: self.is_ntt,
        }
    }
}

impl Add for &Poly {
    type Output = Poly;

    fn add(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, |a, b, q| {
            let sum = a + b;
            if sum >= q {
                sum - q
            } else {
                sum
            }
        })
    }
}

impl AddAssign<&Poly> for Poly {
    fn add_assign(&mut self, rhs: &Self) {
        *self = &*self + rhs;
    }
}

impl Sub for &Poly {
    type Output = Poly;

    fn sub(self, rhs: Self) -> Self::Output {
        self.zip_with(rhs, ModQ::sub)
    }
}

impl SubAssign<&Poly> for Poly {
    fn sub_assign(&mut self, rhs: &Self) {
        *self = &*self - rhs;
    }
}

impl Neg for &Poly {
    type Output = Poly;

    fn neg(self) -> Self::Output {
        let n = self.n.max(1);
        let coeffs = self
            .coeffs
            .chunks(n)
            .zip(&self.moduli)
            .flat_map(|(residue, &q)| residue.iter().map(move |&c| ModQ::negate(c, q)))
            .collect();
        Poly {
            n: self.n,
            moduli: self.moduli.clone(),
            coeffs,
            is_ntt: self.is_ntt,
        }
    }
}
