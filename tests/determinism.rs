//! Responses must not depend on task completion order.
//!
//! The same request evaluated on pools of different sizes, repeatedly, must
//! serialize to identical bytes.

use securesight::protocol;
use securesight::server::{DistanceEvaluator, EvaluatorConfig, ReferenceStore};
use securesight::{ParametersLiteral, SchemeParameters, SecretContext};

fn store() -> ReferenceStore {
    let rows = (0..11)
        .map(|r| (0..4).map(|c| ((r * 4 + c) % 7) as f64 * 0.25).collect())
        .collect();
    let labels = (0..11).map(|r| format!("label{}", r % 3)).collect();
    ReferenceStore::from_rows(rows, labels, 4).unwrap()
}

#[test]
fn test_identical_bytes_across_pool_sizes() {
    let params = SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap();
    let mut client = SecretContext::with_seed(params.clone(), 4, 42).unwrap();
    let queries = (0..5)
        .map(|i| client.encrypt(&[i as f64 * 0.5, 1.0, -0.5, 0.0]).unwrap())
        .collect();
    let request = client.export_public_context(queries);

    let mut reference: Option<Vec<u8>> = None;
    for threads in [1, 2, 8] {
        let config = EvaluatorConfig {
            max_parallelism: threads,
            deadline: None,
        };
        let evaluator = DistanceEvaluator::new(params.clone(), &store(), config).unwrap();

        for round in 0..3 {
            let envelope = evaluator.evaluate(request.clone()).unwrap();
            let bytes = protocol::encode(&envelope).unwrap();
            match &reference {
                None => reference = Some(bytes),
                Some(expected) => assert_eq!(
                    &bytes, expected,
                    "threads={threads} round={round} differs"
                ),
            }
        }
    }
}
