//! RNS-CKKS approximate homomorphic encryption.
//!
//! A compact implementation of the subset of CKKS the distance protocol
//! needs: public-key encryption of real vectors packed into N/2 slots,
//! subtraction of a plaintext vector, ciphertext multiplication with
//! relinearization, and rescaling.
//!
//! # Overview
//!
//! - Ring Z_Q[X]/(X^N + 1) with Q = q_0 · ... · q_L in RNS form
//! - Ciphertext (a, b) decrypts as b + a·s ≈ Δ·m
//! - One auxiliary prime P for hybrid key switching
//!
//! # Example
//!
//! ```
//! use securesight::ckks::{Decryptor, Encoder, Encryptor, KeyGenerator, RingContext};
//! use securesight::params::{ParametersLiteral, SchemeParameters};
//!
//! let params = SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap();
//! let (level, scale) = (params.max_level(), params.default_scale());
//! let ring = RingContext::new(params).unwrap();
//!
//! let mut keygen = KeyGenerator::new(ring.clone());
//! let sk = keygen.gen_secret_key();
//! let pk = keygen.gen_public_key(&sk);
//!
//! let encoder = Encoder::new(ring.clone());
//! let mut encryptor = Encryptor::new(ring.clone(), pk);
//! let decryptor = Decryptor::new(ring, sk);
//!
//! let ct = encryptor.encrypt(&encoder.encode(&[1.5, -2.0], level, scale).unwrap());
//! let values = encoder.decode(&decryptor.decrypt(&ct));
//! assert!((values[0] - 1.5).abs() < 1e-6);
//! ```

pub mod context;
pub mod enc;
pub mod encoder;
pub mod evaluator;
pub mod keygen;
pub mod types;

pub use context::RingContext;
pub use enc::{Decryptor, Encryptor};
pub use encoder::Encoder;
pub use evaluator::Evaluator;
pub use keygen::KeyGenerator;
pub use types::{
    Ciphertext, EvaluationKeySet, KeySwitchDigit, Plaintext, PublicKey, RelinearizationKey,
    SecretKey,
};
