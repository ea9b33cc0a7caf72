//! Server side: reference store, batch packing and encrypted evaluation.
//!
//! The server never holds a secret key. It packs the reference set once and
//! answers each request with one squared-difference ciphertext per
//! (query, batch) pair.

mod evaluate;
mod pack;
mod store;

#[cfg(feature = "server")]
pub mod http;

pub use evaluate::{CancelFlag, DistanceEvaluator, EvaluatorConfig, DEFAULT_DEADLINE};
pub use pack::{pack, Batch};
pub use store::ReferenceStore;
