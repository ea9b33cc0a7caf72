//! Wire messages exchanged between client and server.
//!
//! Both directions carry bincode-encoded serde structures. A request is a
//! [`PublicContext`]: parameters, the relinearization key and the encrypted
//! queries, never the secret key. A response is a [`ResponseEnvelope`] with
//! one list of [`DistanceResult`]s per query, in submission order.

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::ckks::{Ciphertext, EvaluationKeySet, RelinearizationKey};
use crate::error::{err, Result};
use crate::params::SchemeParameters;

/// Upper bound on a decoded payload, guarding allocations driven by
/// untrusted length prefixes.
pub const MAX_PAYLOAD_BYTES: u64 = 1 << 30;

/// MIME type of both request and response bodies.
pub const CONTENT_TYPE: &str = "application/octet-stream";

fn options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_limit(MAX_PAYLOAD_BYTES)
}

/// Serializes a wire message
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    Ok(options().serialize(value)?)
}

/// Deserializes a wire message; any failure is a protocol error
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    Ok(options().deserialize(bytes)?)
}

/// Everything the server needs to evaluate distances, and nothing secret
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublicContext {
    pub params: SchemeParameters,
    pub relinearization_key: RelinearizationKey,
    /// One encrypted, replicated embedding per detection
    pub queries: Vec<Ciphertext>,
}

impl PublicContext {
    /// Checks the request against the server's parameters.
    ///
    /// Parameters must match exactly; every query must be a well-formed
    /// ciphertext with at least one level left for the rescale.
    pub fn validate(&self, expected: &SchemeParameters) -> Result<()> {
        if &self.params != expected {
            return Err(err!(
                Protocol,
                "client parameters differ from server parameters"
            ));
        }
        self.relinearization_key.validate(expected)?;
        for (i, query) in self.queries.iter().enumerate() {
            query
                .validate(expected)
                .map_err(|e| err!(Protocol, "query {}: {}", i, e))?;
            if query.level == 0 {
                return Err(err!(Protocol, "query {} has no level left to rescale", i));
            }
        }
        Ok(())
    }

    /// Evaluation keys derived from the transmitted relinearization key.
    pub fn evaluation_keys(&self) -> EvaluationKeySet {
        EvaluationKeySet::new(self.relinearization_key.clone())
    }

    /// Splits into the parts the evaluator consumes, without copying keys.
    pub fn into_parts(self) -> (SchemeParameters, EvaluationKeySet, Vec<Ciphertext>) {
        (
            self.params,
            EvaluationKeySet::new(self.relinearization_key),
            self.queries,
        )
    }
}

/// Squared-difference ciphertext for one (query, batch) pair, with the
/// labels of the batch's rows in slot-segment order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceResult {
    pub ciphertext: Ciphertext,
    pub labels: Vec<String>,
}

/// Results for one query, tagged with its submission index
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResult {
    pub query_index: usize,
    pub distances: Vec<DistanceResult>,
}

/// Server response: per query, one result per batch in batch order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub distances: Vec<Vec<DistanceResult>>,
    pub params: SchemeParameters,
}
