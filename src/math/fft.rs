//! Canonical embedding for CKKS slot encoding.
//!
//! The special FFT evaluates a real polynomial of degree < N at the primitive
//! 2N-th roots of unity ζ^(5^j), j < N/2. Its inverse packs N/2 complex slot
//! values into N real coefficients: real parts in the low half, imaginary
//! parts in the high half.

use rustfft::num_complex::Complex64;

/// Precomputed rotation group and roots of unity for one ring dimension.
#[derive(Debug, Clone)]
pub struct SpecialFft {
    slots: usize,
    /// M = 2N
    m: usize,
    /// 5^j mod M for j < slots
    rot_group: Vec<usize>,
    /// exp(2πik/M) for k in 0..=M
    ksi_pows: Vec<Complex64>,
}

impl SpecialFft {
    /// Builds tables for ring dimension `ring_dim` (N/2 slots).
    pub fn new(ring_dim: usize) -> Self {
        let slots = ring_dim / 2;
        let m = 2 * ring_dim;

        let mut rot_group = Vec::with_capacity(slots);
        let mut five_pow = 1usize;
        for _ in 0..slots {
            rot_group.push(five_pow);
            five_pow = (five_pow * 5) % m;
        }

        let ksi_pows = (0..=m)
            .map(|k| {
                let angle = 2.0 * std::f64::consts::PI * k as f64 / m as f64;
                Complex64::new(angle.cos(), angle.sin())
            })
            .collect();

        Self {
            slots,
            m,
            rot_group,
            ksi_pows,
        }
    }

    /// Number of complex slots.
    pub fn slots(&self) -> usize {
        self.slots
    }

    /// Coefficient-side values to slot values.
    pub fn forward(&self, vals: &mut [Complex64]) {
        assert_eq!(vals.len(), self.slots, "expected one value per slot");
        let size = self.slots;
        bit_reverse(vals);

        let mut len = 2;
        while len <= size {
            let lenh = len >> 1;
            let lenq = len << 2;
            let gap = self.m / lenq;
            for i in (0..size).step_by(len) {
                for j in 0..lenh {
                    let idx = (self.rot_group[j] % lenq) * gap;
                    let u = vals[i + j];
                    let v = vals[i + j + lenh] * self.ksi_pows[idx];
                    vals[i + j] = u + v;
                    vals[i + j + lenh] = u - v;
                }
            }
            len <<= 1;
        }
    }

    /// Slot values to coefficient-side values.
    pub fn inverse(&self, vals: &mut [Complex64]) {
        assert_eq!(vals.len(), self.slots, "expected one value per slot");
        let size = self.slots;

        let mut len = size;
        while len >= 2 {
            let lenh = len >> 1;
            let lenq = len << 2;
            let gap = self.m / lenq;
            for i in (0..size).step_by(len) {
                for j in 0..lenh {
                    let idx = (lenq - (self.rot_group[j] % lenq)) * gap;
                    let u = vals[i + j] + vals[i + j + lenh];
                    let v = (vals[i + j] - vals[i + j + lenh]) * self.ksi_pows[idx];
                    vals[i + j] = u;
                    vals[i + j + lenh] = v;
                }
            }
            len >>= 1;
        }

        bit_reverse(vals);
        let inv = 1.0 / size as f64;
        for v in vals.iter_mut() {
            *v *= inv;
        }
    }
}

fn bit_reverse(vals: &mut [Complex64]) {
    let size = vals.len();
    let mut j = 0usize;
    for i in 1..size {
        let mut bit = size >> 1;
        while j >= bit {
            j -= bit;
            bit >>= 1;
        }
        j += bit;
        if i < j {
            vals.swap(i, j);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_then_forward_is_identity() {
        let fft = SpecialFft::new(32);
        let original: Vec<Complex64> = (0..fft.slots())
            .map(|i| Complex64::new(i as f64 * 0.5 - 2.0, (i % 3) as f64))
            .collect();

        let mut vals = original.clone();
        fft.inverse(&mut vals);
        fft.forward(&mut vals);

        for (got, want) in vals.iter().zip(&original) {
            assert!((got - want).norm() < 1e-9, "{got} != {want}");
        }
    }

    #[test]
    fn test_constant_slots_give_constant_polynomial() {
        // Every slot equal to c encodes the constant polynomial c.
        let fft = SpecialFft::new(16);
        let mut vals = vec![Complex64::new(3.0, 0.0); fft.slots()];
        fft.inverse(&mut vals);

        assert!((vals[0].re - 3.0).abs() < 1e-12);
        for v in &vals {
            assert!(v.im.abs() < 1e-12);
        }
        for v in &vals[1..] {
            assert!(v.re.abs() < 1e-12);
        }
    }
}
