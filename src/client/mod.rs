//! Client side: key material, query encryption, response decoding and
//! k-NN classification.
//!
//! The client owns the only secret key. It sends the server a
//! [`PublicContext`](crate::protocol::PublicContext) and turns the returned
//! ciphertexts into plaintext distances locally.

mod classify;
mod context;
mod decode;

#[cfg(feature = "client")]
mod api;

pub use classify::{classify, classify_all};
pub use context::SecretContext;
pub use decode::DecodedDistances;

#[cfg(feature = "client")]
pub use api::{ApiClient, KNN_PATH};
