//! Encrypted squared-distance evaluation.
//!
//! For every (query, batch) pair the server computes
//! `rescale((q - b) * (q - b))`: one plaintext subtraction, one relinearized
//! squaring and one rescale. Summing each D-wide slot segment is left to
//! the client, so no rotation keys are needed.
//!
//! Pairs run on a bounded rayon pool: one task per query, and inside it one
//! task per batch. Results are collected in completion order, tagged with
//! their (query, batch) position, and sorted back into submission order
//! before the response is assembled.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use rayon::prelude::*;
use tracing::{debug, info};

use super::pack::{pack, Batch};
use super::store::ReferenceStore;
use crate::ckks::{Ciphertext, Evaluator, RingContext};
use crate::error::{err, Error, Result};
use crate::layout::SlotLayout;
use crate::params::SchemeParameters;
use crate::protocol::{DistanceResult, PublicContext, QueryResult, ResponseEnvelope};

/// Default per-request evaluation deadline.
pub const DEFAULT_DEADLINE: Duration = Duration::from_secs(30);

/// Resource limits for evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluatorConfig {
    /// Worker threads in the evaluation pool; 0 picks rayon's default.
    pub max_parallelism: usize,
    /// Wall-clock budget per request; `None` disables it.
    pub deadline: Option<Duration>,
}

impl Default for EvaluatorConfig {
    fn default() -> Self {
        Self {
            max_parallelism: 0,
            deadline: Some(DEFAULT_DEADLINE),
        }
    }
}

/// Shared cancellation signal observed by in-flight evaluation tasks.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Cancellation flag plus optional deadline, checked before each step.
struct Budget<'a> {
    cancel: &'a CancelFlag,
    started: Instant,
    deadline: Option<Instant>,
}

impl Budget<'_> {
    fn check(&self) -> Result<()> {
        let expired = self.deadline.is_some_and(|d| Instant::now() >= d);
        if expired || self.cancel.is_cancelled() {
            self.cancel.cancel();
            return Err(Error::DeadlineExceeded(self.started.elapsed()));
        }
        Ok(())
    }
}

/// Server-side evaluator over a fixed reference set.
///
/// Batches are packed once at construction and reused by every request.
pub struct DistanceEvaluator {
    ring: Arc<RingContext>,
    layout: SlotLayout,
    batches: Vec<Batch>,
    backend: Evaluator,
    pool: rayon::ThreadPool,
    config: EvaluatorConfig,
}

impl DistanceEvaluator {
    /// Fails with a configuration error if the parameters are invalid or a
    /// reference vector does not fit into one ciphertext.
    pub fn new(
        params: SchemeParameters,
        store: &ReferenceStore,
        config: EvaluatorConfig,
    ) -> Result<Self> {
        let layout = SlotLayout::new(store.dimension(), params.max_slots())?;
        let batches = pack(store, layout.targets_per_batch())?;
        let ring = RingContext::new(params)?;
        let backend = Evaluator::new(ring.clone());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.max_parallelism)
            .thread_name(|i| format!("securesight-eval-{i}"))
            .build()
            .map_err(|e| err!(Configuration, "cannot build evaluation pool: {}", e))?;

        info!(
            rows = store.len(),
            batches = batches.len(),
            targets_per_batch = layout.targets_per_batch(),
            threads = pool.current_num_threads(),
            "distance evaluator ready"
        );

        Ok(Self {
            ring,
            layout,
            batches,
            backend,
            pool,
            config,
        })
    }

    pub fn params(&self) -> &SchemeParameters {
        self.ring.params()
    }

    pub fn layout(&self) -> SlotLayout {
        self.layout
    }

    pub fn batches(&self) -> &[Batch] {
        &self.batches
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    /// Evaluates every (query, batch) pair under the configured deadline.
    pub fn evaluate(&self, request: PublicContext) -> Result<ResponseEnvelope> {
        self.evaluate_with_cancel(request, &CancelFlag::new())
    }

    /// Like [`evaluate`](Self::evaluate), additionally stopping early once
    /// `cancel` is raised. Tasks that have not started a step yet observe the
    /// flag and return [`Error::DeadlineExceeded`].
    pub fn evaluate_with_cancel(
        &self,
        request: PublicContext,
        cancel: &CancelFlag,
    ) -> Result<ResponseEnvelope> {
        request.validate(self.params())?;
        let (params, keys, queries) = request.into_parts();

        let started = Instant::now();
        let budget = Budget {
            cancel,
            started,
            deadline: self.config.deadline.map(|d| started + d),
        };
        let evaluator = self.backend.with_keys(keys);

        let collector: Mutex<Vec<QueryResult>> = Mutex::new(Vec::with_capacity(queries.len()));
        self.pool.install(|| {
            queries
                .par_iter()
                .enumerate()
                .try_for_each(|(query_index, query)| {
                    let distances = self.evaluate_query(&evaluator, query, &budget)?;
                    lock(&collector)?.push(QueryResult {
                        query_index,
                        distances,
                    });
                    Ok::<(), Error>(())
                })
        })?;

        let mut results = collector
            .into_inner()
            .map_err(|_| err!(Evaluation, "result collector poisoned"))?;
        results.sort_by_key(|r| r.query_index);

        debug!(
            queries = results.len(),
            batches = self.batches.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "evaluated request"
        );

        Ok(ResponseEnvelope {
            distances: results.into_iter().map(|r| r.distances).collect(),
            params,
        })
    }

    fn evaluate_query(
        &self,
        evaluator: &Evaluator,
        query: &Ciphertext,
        budget: &Budget<'_>,
    ) -> Result<Vec<DistanceResult>> {
        let collector: Mutex<Vec<(usize, DistanceResult)>> =
            Mutex::new(Vec::with_capacity(self.batches.len()));

        self.batches
            .par_iter()
            .enumerate()
            .try_for_each(|(position, batch)| {
                let result = evaluate_pair(evaluator, query, batch, budget)?;
                lock(&collector)?.push((position, result));
                Ok::<(), Error>(())
            })?;

        let mut results = collector
            .into_inner()
            .map_err(|_| err!(Evaluation, "result collector poisoned"))?;
        results.sort_by_key(|(position, _)| *position);
        Ok(results.into_iter().map(|(_, r)| r).collect())
    }
}

fn evaluate_pair(
    evaluator: &Evaluator,
    query: &Ciphertext,
    batch: &Batch,
    budget: &Budget<'_>,
) -> Result<DistanceResult> {
    budget.check()?;
    let diff = evaluator.sub_plain(query, &batch.packed)?;
    budget.check()?;
    let squared = evaluator.mul_relin(&diff, &diff)?;
    budget.check()?;
    let ciphertext = evaluator.rescale(&squared)?;

    Ok(DistanceResult {
        ciphertext,
        labels: batch.labels.clone(),
    })
}

fn lock<T>(mutex: &Mutex<T>) -> Result<std::sync::MutexGuard<'_, T>> {
    mutex
        .lock()
        .map_err(|_| err!(Evaluation, "result collector poisoned"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::SecretContext;
    use crate::error::ErrorKind;
    use crate::params::ParametersLiteral;

    fn params() -> SchemeParameters {
        SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap()
    }

    fn store() -> ReferenceStore {
        ReferenceStore::from_rows(
            vec![
                vec![1.0, 1.0, 1.0, 1.0],
                vec![2.0, 2.0, 2.0, 2.0],
                vec![0.5, -0.3, 0.25, 3.0],
                vec![0.0, 0.0, 0.0, 0.0],
                vec![-1.0, 0.0, 1.0, 2.0],
            ],
            ["a", "b", "c", "d", "e"].iter().map(|s| s.to_string()).collect(),
            4,
        )
        .unwrap()
    }

    #[test]
    fn test_batches_cached_at_construction() {
        let evaluator = DistanceEvaluator::new(params(), &store(), EvaluatorConfig::default()).unwrap();
        assert_eq!(evaluator.layout().targets_per_batch(), 4);
        assert_eq!(evaluator.batches().len(), 2);
        assert_eq!(evaluator.batches()[1].labels, vec!["e".to_string()]);
    }

    #[test]
    fn test_oversized_dimension_rejected() {
        let wide = ReferenceStore::from_rows(vec![vec![0.0; 17]], vec!["x".into()], 17).unwrap();
        let err = DistanceEvaluator::new(params(), &wide, EvaluatorConfig::default())
            .err()
            .unwrap();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[test]
    fn test_result_shape_and_order() {
        let evaluator = DistanceEvaluator::new(params(), &store(), EvaluatorConfig::default()).unwrap();
        let mut client = SecretContext::with_seed(params(), 4, 11).unwrap();
        let queries = vec![
            client.encrypt(&[1.0, 1.0, 1.0, 1.0]).unwrap(),
            client.encrypt(&[0.0, 0.0, 0.0, 0.0]).unwrap(),
        ];

        let response = evaluator.evaluate(client.export_public_context(queries)).unwrap();
        assert_eq!(response.distances.len(), 2);
        for per_query in &response.distances {
            assert_eq!(per_query.len(), 2);
            assert_eq!(per_query[0].labels, vec!["a", "b", "c", "d"]);
            assert_eq!(per_query[1].labels, vec!["e"]);
            assert_eq!(per_query[0].ciphertext.level, 1);
        }
    }

    #[test]
    fn test_empty_request() {
        let evaluator = DistanceEvaluator::new(params(), &store(), EvaluatorConfig::default()).unwrap();
        let client = SecretContext::with_seed(params(), 4, 3).unwrap();
        let response = evaluator.evaluate(client.export_public_context(vec![])).unwrap();
        assert!(response.distances.is_empty());
    }

    #[test]
    fn test_cancelled_request() {
        let evaluator = DistanceEvaluator::new(params(), &store(), EvaluatorConfig::default()).unwrap();
        let mut client = SecretContext::with_seed(params(), 4, 5).unwrap();
        let query = client.encrypt(&[1.0; 4]).unwrap();

        let cancel = CancelFlag::new();
        cancel.cancel();
        let err = evaluator
            .evaluate_with_cancel(client.export_public_context(vec![query]), &cancel)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }

    #[test]
    fn test_zero_deadline_expires() {
        let config = EvaluatorConfig {
            max_parallelism: 2,
            deadline: Some(Duration::ZERO),
        };
        let evaluator = DistanceEvaluator::new(params(), &store(), config).unwrap();
        let mut client = SecretContext::with_seed(params(), 4, 6).unwrap();
        let query = client.encrypt(&[1.0; 4]).unwrap();
        let err = evaluator
            .evaluate(client.export_public_context(vec![query]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DeadlineExceeded);
    }

    #[test]
    fn test_parameter_mismatch_is_protocol_error() {
        let evaluator = DistanceEvaluator::new(params(), &store(), EvaluatorConfig::default()).unwrap();
        let other = SchemeParameters::from_literal(&ParametersLiteral::toy(6)).unwrap();
        let mut client = SecretContext::with_seed(other, 4, 7).unwrap();
        let query = client.encrypt(&[1.0; 4]).unwrap();
        let err = evaluator
            .evaluate(client.export_public_context(vec![query]))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Protocol);
    }
}
