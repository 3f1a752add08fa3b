use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use stroke_server::api::{self, AppState};
use stroke_server::bundle::ModelBundle;

#[derive(Debug, Parser)]
#[command(name = "stroke-server", about = "Serve stroke-risk predictions over HTTP")]
struct Args {
    /// Path to the trained model bundle.
    #[arg(long, env = "STROKE_MODEL_PATH", default_value = "stroke_ensemble_model.json")]
    model: PathBuf,

    /// Address to listen on.
    #[arg(long, env = "STROKE_ADDR", default_value = "0.0.0.0:8080")]
    addr: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let args = Args::parse();

    let bundle = ModelBundle::load(&args.model)?;
    info!(model = %args.model.display(), trained_at = %bundle.trained_at, "model bundle loaded");
    for message in bundle.category_drift() {
        warn!(%message, "validation categories drift from the trained encoder");
    }

    let state = AppState { bundle: Arc::new(bundle) };
    let app = api::app(state);

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("failed to bind {}", args.addr))?;

    info!(addr = %args.addr, "stroke-server listening");
    info!("  - GET  /            - Health check");
    info!("  - POST /api/predict - Stroke-risk prediction");

    axum::serve(listener, app).await.context("server terminated")?;
    Ok(())
}
