//! Number-Theoretic Transform over an RNS basis.
//!
//! Implements Cooley-Tukey radix-2 NTT for negacyclic convolution over
//! Z_q[X]/(X^N + 1), one transform per residue modulus. Every modulus of the
//! basis must satisfy q ≡ 1 (mod 2N) so that a primitive 2N-th root of unity
//! exists.
//!
//! Values in the evaluation domain are kept in Montgomery form. Additions and
//! subtractions work on them unchanged, and multiplying an evaluation-domain
//! value by a plain scalar with [`ModQ::mul`](super::ModQ::mul) keeps it in
//! Montgomery form.
//!
//! # Example
//!
//! ```
//! use securesight::math::ntt::NttContext;
//!
//! let ctx = NttContext::new(16, 97);
//! let mut residue: Vec<u64> = (0..16).collect();
//! ctx.forward_residue(&mut residue, 0);
//! ctx.inverse_residue(&mut residue, 0);
//! assert_eq!(residue, (0..16).collect::<Vec<u64>>());
//! ```

use super::modular::ModQ;

/// Precomputed twiddle factors and Montgomery constants for a set of moduli.
///
/// Residue `idx` of a polynomial is transformed with the tables of
/// `moduli()[idx]`. Build once per parameter set and share.
#[derive(Clone)]
pub struct NttContext {
    /// Ring dimension (power of two).
    n: usize,
    moduli: Vec<u64>,
    /// -q^(-1) mod 2^64 per modulus.
    q_inv_neg: Vec<u64>,
    /// R^2 mod q per modulus, R = 2^64.
    r_squared: Vec<u64>,
    /// Forward twiddle factors (powers of ψ, bit-reversed order).
    psi_powers: Vec<Vec<u64>>,
    /// Inverse twiddle factors (powers of ψ^(-1), bit-reversed order).
    psi_inv_powers: Vec<Vec<u64>>,
    /// n^(-1) mod q in Montgomery form.
    n_inv: Vec<u64>,
}

impl NttContext {
    /// Creates a single-modulus context.
    pub fn new(n: usize, q: u64) -> Self {
        Self::with_moduli(n, &[q])
    }

    /// Creates a context for every modulus of an RNS basis.
    ///
    /// # Panics
    ///
    /// Panics if `n` is not a power of two, if `moduli` is empty, or if some
    /// modulus is not ≡ 1 (mod 2n). Parameter validation rejects such inputs
    /// before a context is ever built.
    pub fn with_moduli(n: usize, moduli: &[u64]) -> Self {
        assert!(n.is_power_of_two(), "n must be a power of two");
        assert!(!moduli.is_empty(), "moduli must be non-empty");

        let mut q_inv_neg = Vec::with_capacity(moduli.len());
        let mut r_squared = Vec::with_capacity(moduli.len());
        let mut psi_powers = Vec::with_capacity(moduli.len());
        let mut psi_inv_powers = Vec::with_capacity(moduli.len());
        let mut n_inv = Vec::with_capacity(moduli.len());

        for &q in moduli {
            assert!(q % (2 * n as u64) == 1, "q must be ≡ 1 (mod 2n)");

            let q_inv = Self::compute_q_inv_neg(q);
            let r2 = Self::compute_r_squared(q);

            let psi = Self::find_primitive_root(2 * n as u64, q);
            let psi_mont = Self::to_montgomery(psi, q, r2, q_inv);
            let psi_pow = Self::compute_twiddle_factors(n, psi_mont, q, q_inv, r2);

            let psi_inv = ModQ::pow(psi, q - 2, q);
            let psi_inv_mont = Self::to_montgomery(psi_inv, q, r2, q_inv);
            let psi_inv_pow = Self::compute_twiddle_factors(n, psi_inv_mont, q, q_inv, r2);

            let n_inv_val = ModQ::pow(n as u64, q - 2, q);

            q_inv_neg.push(q_inv);
            r_squared.push(r2);
            psi_powers.push(psi_pow);
            psi_inv_powers.push(psi_inv_pow);
            n_inv.push(Self::to_montgomery(n_inv_val, q, r2, q_inv));
        }

        Self {
            n,
            moduli: moduli.to_vec(),
            q_inv_neg,
            r_squared,
            psi_powers,
            psi_inv_powers,
            n_inv,
        }
    }

    /// Returns the ring dimension.
    pub fn dimension(&self) -> usize {
        self.n
    }

    /// Returns the moduli of the basis, in table order.
    pub fn moduli(&self) -> &[u64] {
        &self.moduli
    }

    /// Table index of modulus `q`, if it belongs to the basis.
    pub fn position(&self, q: u64) -> Option<usize> {
        self.moduli.iter().position(|&m| m == q)
    }

    /// Forward NTT of one residue: standard coefficients in, Montgomery
    /// evaluations out.
    ///
    /// # Panics
    ///
    /// Panics if `residue.len() != n`.
    pub fn forward_residue(&self, residue: &mut [u64], idx: usize) {
        assert_eq!(residue.len(), self.n, "residue length must equal n");
        let q = self.moduli[idx];
        for c in residue.iter_mut() {
            *c = Self::to_montgomery(*c, q, self.r_squared[idx], self.q_inv_neg[idx]);
        }
        self.forward_inplace_at(residue, idx);
    }

    /// Inverse NTT of one residue: Montgomery evaluations in, standard
    /// coefficients out.
    ///
    /// # Panics
    ///
    /// Panics if `residue.len() != n`.
    pub fn inverse_residue(&self, residue: &mut [u64], idx: usize) {
        assert_eq!(residue.len(), self.n, "residue length must equal n");
        self.inverse_inplace_at(residue, idx);
        for c in residue.iter_mut() {
            *c = self.montgomery_mul_at(*c, 1, idx);
        }
    }

    /// Pointwise product of two evaluation-domain residues.
    pub fn mul_residue(&self, a: &[u64], b: &[u64], out: &mut [u64], idx: usize) {
        assert_eq!(a.len(), self.n);
        assert_eq!(b.len(), self.n);
        assert_eq!(out.len(), self.n);
        for ((o, &x), &y) in out.iter_mut().zip(a).zip(b) {
            *o = self.montgomery_mul_at(x, y, idx);
        }
    }

    /// Fused `acc += a * b` over evaluation-domain residues.
    pub fn mul_acc_residue(&self, acc: &mut [u64], a: &[u64], b: &[u64], idx: usize) {
        assert_eq!(acc.len(), self.n);
        assert_eq!(a.len(), self.n);
        assert_eq!(b.len(), self.n);
        let q = self.moduli[idx];
        for ((o, &x), &y) in acc.iter_mut().zip(a).zip(b) {
            let prod = self.montgomery_mul_at(x, y, idx);
            let sum = *o + prod;
            *o = if sum >= q { sum - q } else { sum };
        }
    }

    /// Forward NTT over a flat buffer holding every residue of the basis.
    pub fn forward(&self, coeffs: &mut [u64]) {
        assert_eq!(
            coeffs.len(),
            self.n * self.moduli.len(),
            "input length must match dimension * moduli"
        );
        for (idx, chunk) in coeffs.chunks_mut(self.n).enumerate() {
            self.forward_residue(chunk, idx);
        }
    }

    /// Inverse NTT over a flat buffer holding every residue of the basis.
    pub fn inverse(&self, coeffs: &mut [u64]) {
        assert_eq!(
            coeffs.len(),
            self.n * self.moduli.len(),
            "input length must match dimension * moduli"
        );
        for (idx, chunk) in coeffs.chunks_mut(self.n).enumerate() {
            self.inverse_residue(chunk, idx);
        }
    }

    fn forward_inplace_at(&self, coeffs: &mut [u64], idx: usize) {
        let n = self.n;
        let q = self.moduli[idx];
        let psi_powers = &self.psi_powers[idx];

        let mut t = n;
        let mut m = 1;

        while m < n {
            t >>= 1;
            for i in 0..m {
                let j1 = 2 * i * t;
                let j2 = j1 + t;
                let w = psi_powers[m + i];

                for j in j1..j2 {
                    let u = coeffs[j];
                    let v = self.montgomery_mul_at(coeffs[j + t], w, idx);

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    coeffs[j + t] = if u >= v { u - v } else { q - v + u };
                }
            }
            m <<= 1;
        }
    }

    fn inverse_inplace_at(&self, coeffs: &mut [u64], idx: usize) {
        let n = self.n;
        let q = self.moduli[idx];
        let psi_inv_powers = &self.psi_inv_powers[idx];

        let mut t = 1;
        let mut m = n;

        while m > 1 {
            m >>= 1;
            for i in 0..m {
                let j2 = i * 2 * t;
                let w = psi_inv_powers[m + i];

                for j in j2..(j2 + t) {
                    let u = coeffs[j];
                    let v = coeffs[j + t];

                    coeffs[j] = if u + v >= q { u + v - q } else { u + v };
                    let diff = if u >= v { u - v } else { q - v + u };
                    coeffs[j + t] = self.montgomery_mul_at(diff, w, idx);
                }
            }
            t <<= 1;
        }

        for c in coeffs.iter_mut() {
            *c = self.montgomery_mul_at(*c, self.n_inv[idx], idx);
        }
    }

    #[inline]
    fn montgomery_mul_at(&self, a: u64, b: u64, idx: usize) -> u64 {
        Self::montgomery_reduce(
            (a as u128) * (b as u128),
            self.moduli[idx],
            self.q_inv_neg[idx],
        )
    }

    #[inline]
    fn montgomery_reduce(ab: u128, q: u64, q_inv_neg: u64) -> u64 {
        let m = ((ab as u64).wrapping_mul(q_inv_neg)) as u128;
        let t = ((ab + m * (q as u128)) >> 64) as u64;
        if t >= q {
            t - q
        } else {
            t
        }
    }

    fn to_montgomery(a: u64, q: u64, r_squared: u64, q_inv_neg: u64) -> u64 {
        Self::montgomery_reduce((a as u128) * (r_squared as u128), q, q_inv_neg)
    }

    fn compute_q_inv_neg(q: u64) -> u64 {
        let mut y: u64 = 1;
        for i in 1..64 {
            let yi = y.wrapping_mul(q) & (1u64 << i);
            y |= yi;
        }
        y.wrapping_neg()
    }

    fn compute_r_squared(q: u64) -> u64 {
        let r_mod_q = (1u128 << 64) % (q as u128);
        ((r_mod_q * r_mod_q) % (q as u128)) as u64
    }

    /// Primitive `order`-th root of unity modulo prime q.
    fn find_primitive_root(order: u64, q: u64) -> u64 {
        let exp = (q - 1) / order;
        for g in 2..q {
            let candidate = ModQ::pow(g, exp, q);
            if ModQ::pow(candidate, order / 2, q) != 1 {
                return candidate;
            }
        }
        panic!("no primitive root of order {order} modulo {q}");
    }

    fn compute_twiddle_factors(
        n: usize,
        psi: u64,
        q: u64,
        q_inv_neg: u64,
        r_squared: u64,
    ) -> Vec<u64> {
        let mut factors = vec![0u64; n];
        let one = Self::to_montgomery(1, q, r_squared, q_inv_neg);
        if n > 1 {
            factors[1] = one;
        }

        for m in 1..n {
            if m.is_power_of_two() {
                let exp = n / (2 * m);
                let mut pow = one;
                for _ in 0..exp {
                    pow = Self::montgomery_reduce((pow as u128) * (psi as u128), q, q_inv_neg);
                }
                factors[m] = pow;
            } else {
                let prev_idx = m & (m - 1);
                let step_idx = m & (!m + 1);
                factors[m] = Self::montgomery_reduce(
                    (factors[prev_idx] as u128) * (factors[step_idx] as u128),
                    q,
                    q_inv_neg,
                );
            }
        }

        factors
    }
}

impl std::fmt::Debug for NttContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NttContext")
            .field("n", &self.n)
            .field("moduli", &self.moduli)
            .finish()
    }
}
