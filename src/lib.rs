//! SecureSight: privacy-preserving k-nearest-neighbour classification
//!
//! A client encrypts face or object embeddings under RNS-CKKS and sends them,
//! with its relinearization key, to a server holding a labeled plaintext
//! reference set. The server returns encrypted squared differences packed
//! into slot segments; only the client can decrypt them, sum each segment
//! into a distance and take a majority vote over the k closest labels.
//!
//! Key components:
//! - [`ckks`]: encoder, key generation, encryption and the three evaluator
//!   operations the protocol needs
//! - [`layout`]: how one embedding is replicated across the slot vector
//! - [`server`]: reference store, batch packer and the parallel evaluator
//! - [`client`]: key material, response decoding and classification
//! - [`protocol`]: bincode wire messages

pub mod ckks;
pub mod client;
pub mod error;
pub mod layout;
pub mod math;
pub mod params;
pub mod protocol;
pub mod server;

pub use client::{classify, classify_all, DecodedDistances, SecretContext};
pub use error::{Error, ErrorKind, Result};
pub use layout::{batch_size, SlotLayout};
pub use params::{ParametersLiteral, SchemeParameters};
pub use protocol::{DistanceResult, PublicContext, QueryResult, ResponseEnvelope};
pub use server::{DistanceEvaluator, EvaluatorConfig, ReferenceStore};
