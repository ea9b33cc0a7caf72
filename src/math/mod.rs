//! Mathematical primitives for the CKKS backend.
//!
//! - **Modular arithmetic** over word-sized primes, including primality tests
//! - **NTT-friendly prime generation** for RNS bases
//! - **Number-Theoretic Transform (NTT)** with Montgomery arithmetic
//! - **RNS polynomials** over Z_Q[X]/(X^N + 1)
//! - **CRT reconstruction** of centered values for decoding
//! - **Special FFT** for the canonical embedding used by slot encoding
//! - **Samplers** for Gaussian errors, ternary secrets and uniform masks
//!
//! # Example
//!
//! ```
//! use securesight::math::{NttContext, Poly};
//! use securesight::math::primes::ntt_primes;
//!
//! let moduli = ntt_primes(&[60, 40], 256, &[]).unwrap();
//! let ctx = NttContext::with_moduli(256, &moduli);
//! let mut poly = Poly::from_signed(&vec![3; 256], &moduli);
//! poly.to_ntt(&ctx);
//! assert!(poly.is_ntt());
//! ```

pub mod crt;
pub mod fft;
pub mod gaussian;
pub mod modular;
pub mod ntt;
pub mod poly;
pub mod primes;

pub use crt::GarnerBasis;
pub use fft::SpecialFft;
pub use gaussian::GaussianSampler;
pub use modular::ModQ;
pub use ntt::NttContext;
pub use poly::Poly;
