//! securesight-client: classify detections against a remote reference set
//!
//! Reads detections (bounding box plus embedding) as JSON, encrypts the
//! embeddings, asks the server for encrypted distances and prints the
//! k-NN label of each detection.

use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use eyre::{Context, Result};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use securesight::client::ApiClient;
use securesight::{classify_all, ParametersLiteral, SchemeParameters, SecretContext};

#[derive(Parser)]
#[command(name = "securesight-client")]
#[command(about = "Encrypted k-NN classification client")]
#[command(version)]
struct Args {
    /// Server base URL
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// JSON file with `[{"bbox": [x1, y1, x2, y2], "embedding": [...]}]`
    #[arg(long)]
    detections: PathBuf,

    /// Number of neighbours in the majority vote
    #[arg(long, default_value_t = 5)]
    k: usize,

    /// Embedding dimension D
    #[arg(long, default_value_t = 512)]
    dimension: usize,

    /// Override the ring degree of the default parameter set (log2 N)
    #[arg(long)]
    log_n: Option<u32>,
}

#[derive(Deserialize)]
struct Detection {
    bbox: [f64; 4],
    embedding: Vec<f64>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    let file = File::open(&args.detections)
        .with_context(|| format!("Failed to open {}", args.detections.display()))?;
    let detections: Vec<Detection> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| "Failed to parse detections")?;
    info!("Loaded {} detections", detections.len());
    if detections.is_empty() {
        return Ok(());
    }

    let mut literal = ParametersLiteral::securesight();
    if let Some(log_n) = args.log_n {
        literal.log_n = log_n;
    }
    let params = SchemeParameters::from_literal(&literal).wrap_err("invalid parameters")?;

    let keygen_start = Instant::now();
    let mut context =
        SecretContext::new(params, args.dimension).wrap_err("failed to set up client keys")?;
    info!("Key generation: {:.2?}", keygen_start.elapsed());

    let encrypt_start = Instant::now();
    let queries = detections
        .iter()
        .enumerate()
        .map(|(i, d)| {
            context
                .encrypt(&d.embedding)
                .wrap_err_with(|| format!("detection {i}"))
        })
        .collect::<Result<Vec<_>>>()?;
    info!("Encryption: {:.2?}", encrypt_start.elapsed());

    let request_start = Instant::now();
    let api = ApiClient::new(args.server.as_str());
    let envelope = api
        .predict(&context.export_public_context(queries))
        .await
        .wrap_err_with(|| format!("request to {} failed", api.base_url()))?;
    info!("Server round trip: {:.2?}", request_start.elapsed());

    let (distances, labels) = context
        .decode_response(&envelope)
        .wrap_err("failed to decode response")?;
    let classes = classify_all(&distances, &labels, args.k)?;

    for (detection, class) in detections.iter().zip(&classes) {
        let [x1, y1, x2, y2] = detection.bbox;
        println!("{class} @ [{x1}, {y1}, {x2}, {y2}]");
    }

    Ok(())
}
