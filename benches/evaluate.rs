use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use securesight::server::{DistanceEvaluator, EvaluatorConfig, ReferenceStore};
use securesight::{ParametersLiteral, SchemeParameters, SecretContext};

const DIMENSION: usize = 8;

fn test_params() -> SchemeParameters {
    SchemeParameters::from_literal(&ParametersLiteral::toy(10)).unwrap()
}

fn store(rows: usize) -> ReferenceStore {
    let data = (0..rows)
        .map(|r| (0..DIMENSION).map(|c| ((r + c) % 11) as f64 / 11.0).collect())
        .collect();
    let labels = (0..rows).map(|r| format!("id{}", r % 17)).collect();
    ReferenceStore::from_rows(data, labels, DIMENSION).unwrap()
}

fn evaluate_benchmark(c: &mut Criterion) {
    let params = test_params();
    let mut client = SecretContext::with_seed(params.clone(), DIMENSION, 1).unwrap();
    let queries = (0..4)
        .map(|i| client.encrypt(&vec![i as f64 * 0.1; DIMENSION]).unwrap())
        .collect();
    let request = client.export_public_context(queries);

    let mut group = c.benchmark_group("evaluate");
    group.sample_size(10);

    for rows in [64, 256, 1024] {
        let store = store(rows);
        for (name, threads) in [("parallel", 0), ("sequential", 1)] {
            let config = EvaluatorConfig {
                max_parallelism: threads,
                deadline: None,
            };
            let evaluator = DistanceEvaluator::new(params.clone(), &store, config).unwrap();

            group.bench_with_input(
                BenchmarkId::new(name, format!("{}_rows", rows)),
                &rows,
                |b, _| {
                    b.iter(|| evaluator.evaluate(request.clone()).unwrap());
                },
            );
        }
    }

    group.finish();
}

criterion_group!(benches, evaluate_benchmark);
criterion_main!(benches);
