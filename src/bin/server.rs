//! securesight-server: encrypted k-NN distance server with HTTP API
//!
//! Loads a labeled reference CSV, packs it once, and answers encrypted
//! distance requests.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use clap::Parser;
use eyre::{Context, Result};
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use securesight::server::http::{router, AppState};
use securesight::server::{DistanceEvaluator, EvaluatorConfig, ReferenceStore};
use securesight::{ParametersLiteral, SchemeParameters};

#[derive(Parser)]
#[command(name = "securesight-server")]
#[command(about = "Encrypted k-NN distance server")]
#[command(version)]
struct Args {
    /// Reference CSV: D features then a label per row, no header
    #[arg(long)]
    reference: PathBuf,

    /// Server bind address
    #[arg(long, default_value = "0.0.0.0:8080")]
    bind: String,

    /// Embedding dimension D
    #[arg(long, default_value_t = 512)]
    dimension: usize,

    /// Evaluation threads (0 = one per core)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Per-request deadline in milliseconds (0 = none)
    #[arg(long, default_value_t = 30_000)]
    deadline_ms: u64,

    /// Override the ring degree of the default parameter set (log2 N)
    #[arg(long)]
    log_n: Option<u32>,

    /// Maximum request body in MiB
    #[arg(long, default_value_t = 256)]
    max_body_mb: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let args = Args::parse();

    info!("SecureSight server");
    info!("Reference set: {}", args.reference.display());

    let mut literal = ParametersLiteral::securesight();
    if let Some(log_n) = args.log_n {
        literal.log_n = log_n;
    }
    let params = SchemeParameters::from_literal(&literal).wrap_err("invalid parameters")?;
    info!(
        "Parameters: N={}, slots={}, levels={}",
        params.ring_dim(),
        params.max_slots(),
        params.max_level()
    );

    let load_start = Instant::now();
    let store = ReferenceStore::load_path(&args.reference, args.dimension).wrap_err_with(|| {
        format!("failed to load reference set {}", args.reference.display())
    })?;
    info!("Loaded {} reference rows of dimension {}", store.len(), store.dimension());

    let config = EvaluatorConfig {
        max_parallelism: args.threads,
        deadline: (args.deadline_ms > 0).then(|| Duration::from_millis(args.deadline_ms)),
    };
    let evaluator = DistanceEvaluator::new(params, &store, config)
        .wrap_err("failed to build distance evaluator")?;
    info!("Load time: {:.2?}", load_start.elapsed());

    let app = router(Arc::new(AppState::new(evaluator)), args.max_body_mb << 20);

    info!("Starting server on {}", args.bind);
    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .wrap_err_with(|| format!("cannot bind {}", args.bind))?;

    println!();
    println!("=== SecureSight Server Running ===");
    println!("Listening on: http://{}", args.bind);
    println!();
    println!("Endpoints:");
    println!("  GET  /health   - Health check");
    println!("  GET  /params   - Scheme parameters and reference shape");
    println!("  POST /api/knn  - Encrypted distance evaluation");
    println!();

    axum::serve(listener, app).await?;

    Ok(())
}
