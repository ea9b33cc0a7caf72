//! Decrypting server responses back into per-row distances.
//!
//! Every returned ciphertext holds, in slot segment `i`, the squared
//! coordinate differences between the query and row `i` of one batch.
//! Summing a segment gives that row's squared Euclidean distance. Slots
//! beyond the batch's label count are never read.

use std::time::Instant;

use tracing::debug;

use super::context::SecretContext;
use crate::ckks::Ciphertext;
use crate::error::{err, Result};
use crate::protocol::{DistanceResult, ResponseEnvelope};

/// Per-query distances and the labels they belong to, position for position.
pub type DecodedDistances = (Vec<Vec<f64>>, Vec<Vec<String>>);

impl SecretContext {
    /// Decrypts `ct` and decodes all slots.
    pub fn decrypt_slots(&self, ct: &Ciphertext) -> Result<Vec<f64>> {
        ct.validate(self.params())?;
        Ok(self.encoder.decode(&self.decryptor.decrypt(ct)))
    }

    /// Unpacks every query's results into flat (distance, label) lists,
    /// ordered by batch and then by position within the batch.
    pub fn decode(&self, responses: &[Vec<DistanceResult>]) -> Result<DecodedDistances> {
        let started = Instant::now();
        let mut all_distances = Vec::with_capacity(responses.len());
        let mut all_labels = Vec::with_capacity(responses.len());

        for (query, results) in responses.iter().enumerate() {
            let mut distances: Vec<f64> = Vec::new();
            let mut labels = Vec::new();

            for (batch, result) in results.iter().enumerate() {
                if result.labels.len() > self.layout.targets_per_batch() {
                    return Err(err!(
                        Protocol,
                        "query {} batch {} carries {} labels, at most {} fit",
                        query,
                        batch,
                        result.labels.len(),
                        self.layout.targets_per_batch()
                    ));
                }

                let slots = self.decrypt_slots(&result.ciphertext)?;
                for (i, label) in result.labels.iter().enumerate() {
                    distances.push(slots[self.layout.segment(i)].iter().sum());
                    labels.push(label.clone());
                }
            }

            all_distances.push(distances);
            all_labels.push(labels);
        }

        debug!(
            queries = responses.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "decoded response"
        );
        Ok((all_distances, all_labels))
    }

    /// Checks the envelope's parameters against this session, then decodes.
    pub fn decode_response(&self, envelope: &ResponseEnvelope) -> Result<DecodedDistances> {
        if &envelope.params != self.params() {
            return Err(err!(
                Protocol,
                "response parameters differ from client parameters"
            ));
        }
        self.decode(&envelope.distances)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::params::{ParametersLiteral, SchemeParameters};

    fn context() -> SecretContext {
        let params = SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap();
        SecretContext::with_seed(params, 4, 21).unwrap()
    }

    fn squared_distance_ct(ctx: &mut SecretContext, query: &[f64], packed: &[f64]) -> Ciphertext {
        let ct = ctx.encrypt(query).unwrap();
        let evaluator = ctx.evaluator();
        let diff = evaluator.sub_plain(&ct, packed).unwrap();
        evaluator
            .rescale(&evaluator.mul_relin(&diff, &diff).unwrap())
            .unwrap()
    }

    #[test]
    fn test_segments_sum_to_distances() {
        let mut ctx = context();
        let packed = [[1.0; 4], [2.0; 4], [0.0; 4]].concat();
        let ct = squared_distance_ct(&mut ctx, &[1.0; 4], &packed);

        let responses = vec![vec![DistanceResult {
            ciphertext: ct,
            labels: vec!["same".into(), "twos".into(), "zeros".into()],
        }]];
        let (distances, labels) = ctx.decode(&responses).unwrap();

        assert_eq!(labels[0], vec!["same", "twos", "zeros"]);
        for (got, want) in distances[0].iter().zip([0.0, 4.0, 4.0]) {
            assert!((got - want).abs() < 1e-3, "{got} != {want}");
        }
    }

    #[test]
    fn test_too_many_labels_is_protocol_error() {
        let mut ctx = context();
        let ct = squared_distance_ct(&mut ctx, &[0.0; 4], &[0.0; 16]);
        let responses = vec![vec![DistanceResult {
            ciphertext: ct,
            labels: (0..5).map(|i| i.to_string()).collect(),
        }]];
        assert_eq!(ctx.decode(&responses).unwrap_err().kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_parameter_mismatch_is_protocol_error() {
        let ctx = context();
        let envelope = ResponseEnvelope {
            distances: vec![],
            params: SchemeParameters::from_literal(&ParametersLiteral::toy(6)).unwrap(),
        };
        assert_eq!(
            ctx.decode_response(&envelope).unwrap_err().kind(),
            ErrorKind::Protocol
        );
    }

    #[test]
    fn test_malformed_ciphertext_is_protocol_error() {
        let mut ctx = context();
        let mut ct = ctx.encrypt(&[0.0; 4]).unwrap();
        ct.level = 7;
        let responses = vec![vec![DistanceResult {
            ciphertext: ct,
            labels: vec!["x".into()],
        }]];
        assert_eq!(ctx.decode(&responses).unwrap_err().kind(), ErrorKind::Protocol);
    }
}
