//! axum surface over [`DistanceEvaluator`].
//!
//! | Method | Path       | Body                                 |
//! |--------|------------|--------------------------------------|
//! | POST   | `/api/knn` | bincode `PublicContext` → `ResponseEnvelope` |
//! | GET    | `/health`  | JSON status                          |
//! | GET    | `/params`  | JSON parameters and reference shape  |
//!
//! Evaluation is CPU bound and runs on tokio's blocking pool, which hands it
//! to the evaluator's rayon pool. When the request deadline fires the shared
//! [`CancelFlag`] is raised so in-flight tasks stop at their next step.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::evaluate::{CancelFlag, DistanceEvaluator};
use crate::error::{err, Error, ErrorKind, Result};
use crate::params::SchemeParameters;
use crate::protocol::{self, PublicContext, CONTENT_TYPE};

/// Default request body limit.
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 << 20;

/// Shared handler state
pub struct AppState {
    evaluator: Arc<DistanceEvaluator>,
    rows: usize,
}

impl AppState {
    pub fn new(evaluator: DistanceEvaluator) -> Self {
        let rows = evaluator.batches().iter().map(|b| b.labels.len()).sum();
        Self {
            evaluator: Arc::new(evaluator),
            rows,
        }
    }

    pub fn evaluator(&self) -> &DistanceEvaluator {
        &self.evaluator
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ParamsResponse {
    pub version: String,
    pub params: SchemeParameters,
    pub ring_dim: usize,
    pub max_slots: usize,
    pub rows: usize,
    pub dimension: usize,
    pub batches: usize,
    pub targets_per_batch: usize,
}

/// JSON body of every non-success response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
}

/// [`Error`] rendered as an HTTP response
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

/// HTTP status for each error category
pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::Protocol | ErrorKind::DataFormat => StatusCode::BAD_REQUEST,
        ErrorKind::Configuration | ErrorKind::Evaluation => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::DeadlineExceeded => StatusCode::GATEWAY_TIMEOUT,
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        if status.is_server_error() {
            warn!(%kind, error = %self.0, "request failed");
        } else {
            debug!(%kind, error = %self.0, "request rejected");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
            kind,
        };
        (status, Json(body)).into_response()
    }
}

/// Builds the application router
pub fn router(state: Arc<AppState>, max_body_bytes: usize) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/params", get(get_params))
        .route("/api/knn", post(handle_knn))
        .layer(DefaultBodyLimit::max(max_body_bytes))
        .with_state(state)
}

async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

async fn get_params(State(state): State<Arc<AppState>>) -> Json<ParamsResponse> {
    let evaluator = state.evaluator();
    let params = evaluator.params();
    let layout = evaluator.layout();
    Json(ParamsResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        params: params.clone(),
        ring_dim: params.ring_dim(),
        max_slots: params.max_slots(),
        rows: state.rows,
        dimension: layout.dimension(),
        batches: evaluator.batches().len(),
        targets_per_batch: layout.targets_per_batch(),
    })
}

async fn handle_knn(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> std::result::Result<Response, ApiError> {
    let started = Instant::now();
    let request_bytes = body.len();
    let cancel = CancelFlag::new();

    let task = {
        let evaluator = state.evaluator.clone();
        let cancel = cancel.clone();
        tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let request: PublicContext = protocol::decode(&body)?;
            let envelope = evaluator.evaluate_with_cancel(request, &cancel)?;
            protocol::encode(&envelope)
        })
    };

    let joined = match state.evaluator.config().deadline {
        Some(deadline) => match tokio::time::timeout(deadline, task).await {
            Ok(joined) => joined,
            Err(_) => {
                cancel.cancel();
                return Err(Error::DeadlineExceeded(started.elapsed()).into());
            }
        },
        None => task.await,
    };
    let response = joined.map_err(|e| err!(Evaluation, "evaluation task failed: {}", e))??;

    debug!(
        request_bytes,
        response_bytes = response.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "served knn request"
    );
    Ok(([(header::CONTENT_TYPE, CONTENT_TYPE)], response).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::Protocol), StatusCode::BAD_REQUEST);
        assert_eq!(status_for(ErrorKind::DataFormat), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(ErrorKind::Evaluation),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_for(ErrorKind::DeadlineExceeded),
            StatusCode::GATEWAY_TIMEOUT
        );
    }

    #[test]
    fn test_error_response_shape() {
        let body = ErrorResponse {
            error: "protocol error: truncated".into(),
            kind: ErrorKind::Protocol,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["kind"], "protocol");
        assert_eq!(json["error"], "protocol error: truncated");
    }
}
