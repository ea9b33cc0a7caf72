//! HTTP round trip through `/api/knn`.

#![cfg(all(feature = "server", feature = "client"))]

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::StatusCode;
use tokio::net::TcpListener;

use securesight::client::ApiClient;
use securesight::server::http::{
    router, AppState, ErrorResponse, HealthResponse, ParamsResponse, DEFAULT_MAX_BODY_BYTES,
};
use securesight::server::{DistanceEvaluator, EvaluatorConfig, ReferenceStore};
use securesight::{classify_all, ErrorKind, ParametersLiteral, SchemeParameters, SecretContext};

fn toy_params() -> SchemeParameters {
    SchemeParameters::from_literal(&ParametersLiteral::toy(5)).unwrap()
}

async fn spawn_server() -> (String, tokio::task::JoinHandle<()>) {
    let store = ReferenceStore::load(
        "1,1,1,1,cat\n2,2,2,2,dog\n1.1,1,1,1,cat\n0,0,0,0,owl\n2.1,2,2,2,dog\n".as_bytes(),
        4,
    )
    .expect("reference set should parse");
    let evaluator = DistanceEvaluator::new(toy_params(), &store, EvaluatorConfig::default())
        .expect("evaluator should build");
    let app = router(Arc::new(AppState::new(evaluator)), DEFAULT_MAX_BODY_BYTES);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind should succeed");
    let addr: SocketAddr = listener.local_addr().expect("local addr");

    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.expect("server should run");
    });
    (format!("http://{}", addr), handle)
}

#[tokio::test]
async fn http_knn_round_trip() {
    let (base_url, server_handle) = spawn_server().await;

    let mut client = SecretContext::with_seed(toy_params(), 4, 9).expect("client keys");
    let queries = vec![
        client.encrypt(&[1.05, 1.0, 1.0, 1.0]).unwrap(),
        client.encrypt(&[2.0, 2.05, 2.0, 2.0]).unwrap(),
    ];

    let api = ApiClient::new(base_url.as_str());
    let envelope = api
        .predict(&client.export_public_context(queries))
        .await
        .expect("request should succeed");

    let (distances, labels) = client.decode_response(&envelope).expect("decode");
    assert_eq!(labels[0], vec!["cat", "dog", "cat", "owl", "dog"]);
    let classes = classify_all(&distances, &labels, 2).unwrap();
    assert_eq!(classes, vec!["cat", "dog"]);

    server_handle.abort();
}

#[tokio::test]
async fn http_knn_rejects_garbage() {
    let (base_url, server_handle) = spawn_server().await;
    let http = reqwest::Client::new();

    let response = http
        .post(format!("{}/api/knn", base_url))
        .body(vec![1u8, 2, 3])
        .send()
        .await
        .expect("request should succeed");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST.as_u16());
    let body: ErrorResponse = response.json().await.expect("parse error response");
    assert_eq!(body.kind, ErrorKind::Protocol);

    let err = ApiClient::new(base_url.as_str())
        .predict_bytes(vec![0xff; 16])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);

    server_handle.abort();
}

#[tokio::test]
async fn http_health_and_params() {
    let (base_url, server_handle) = spawn_server().await;
    let http = reqwest::Client::new();

    let health: HealthResponse = http
        .get(format!("{}/health", base_url))
        .send()
        .await
        .expect("health request")
        .json()
        .await
        .expect("health body");
    assert_eq!(health.status, "ok");

    let params: ParamsResponse = http
        .get(format!("{}/params", base_url))
        .send()
        .await
        .expect("params request")
        .json()
        .await
        .expect("params body");
    assert_eq!(params.params.q_moduli, toy_params().q_moduli);
    assert_eq!(params.params.p_modulus, toy_params().p_modulus);
    assert_eq!(params.rows, 5);
    assert_eq!(params.dimension, 4);
    assert_eq!(params.batches, 2);
    assert_eq!(params.targets_per_batch, 4);

    server_handle.abort();
}
