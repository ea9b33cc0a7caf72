//! HTTP client for the `/api/knn` endpoint.

use std::time::Instant;

use serde::Deserialize;
use tracing::debug;

use crate::error::{err, Error, ErrorKind, Result};
use crate::protocol::{self, PublicContext, ResponseEnvelope, CONTENT_TYPE};

/// Path of the distance endpoint, relative to the server base URL.
pub const KNN_PATH: &str = "/api/knn";

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
    kind: ErrorKind,
}

/// Posts encrypted queries to a running server.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl ApiClient {
    /// `base_url` is the scheme and authority, e.g. `http://127.0.0.1:8080`.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), base_url)
    }

    pub fn with_client(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Serializes `context`, posts it and decodes the response envelope.
    pub async fn predict(&self, context: &PublicContext) -> Result<ResponseEnvelope> {
        let body = protocol::encode(context)?;
        debug!(request_bytes = body.len(), queries = context.queries.len(), "sending request");
        let bytes = self.predict_bytes(body).await?;
        protocol::decode(&bytes)
    }

    /// Posts an already serialized request and returns the raw response body.
    ///
    /// A non-success status is turned back into the server's error variant
    /// when the body carries one.
    pub async fn predict_bytes(&self, body: Vec<u8>) -> Result<Vec<u8>> {
        let started = Instant::now();
        let response = self
            .http
            .post(format!("{}{}", self.base_url, KNN_PATH))
            .header(reqwest::header::CONTENT_TYPE, CONTENT_TYPE)
            .body(body)
            .send()
            .await
            .map_err(|e| err!(Protocol, "request failed: {}", e))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| err!(Protocol, "reading response failed: {}", e))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(body) => from_kind(body.kind, body.error),
                Err(_) => err!(Protocol, "server returned {}", status),
            });
        }

        debug!(
            response_bytes = bytes.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "received response"
        );
        Ok(bytes.to_vec())
    }
}

fn from_kind(kind: ErrorKind, message: String) -> Error {
    match kind {
        ErrorKind::Configuration => Error::Configuration(message),
        ErrorKind::DataFormat => Error::DataFormat(message),
        ErrorKind::Protocol => Error::Protocol(message),
        ErrorKind::Evaluation => Error::Evaluation(message),
        // the elapsed time is only known server side
        ErrorKind::DeadlineExceeded => Error::DeadlineExceeded(Default::default()),
    }
}
