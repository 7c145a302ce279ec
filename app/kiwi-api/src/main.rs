//! HTTP entry point: wires the engine behind an axum router.

mod routes;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::sync::RwLock;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kiwi_rag::llm::AnthropicClient;
use kiwi_rag::{RagConfig, RagEngine};

#[derive(Parser, Debug)]
#[command(name = "kiwi-api", about = "HTTP API over the Kiwi knowledge base")]
struct Args {
    /// Listen address.
    #[arg(long, default_value = "0.0.0.0:8000")]
    bind: String,

    /// Optional JSON config file; defaults apply otherwise.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the directory scanned for JSON sources.
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Override the persisted index location.
    #[arg(long)]
    index_path: Option<PathBuf>,

    /// Force a rebuild at startup even when a persisted index exists.
    #[arg(long)]
    rebuild: bool,
}

pub type SharedEngine = Arc<RwLock<RagEngine>>;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => RagConfig::from_file(path).map_err(|e| anyhow::anyhow!(e))?,
        None => RagConfig::default(),
    };
    if let Some(data_dir) = args.data_dir.clone() {
        config.data_dir = data_dir;
    }
    if let Some(index_path) = args.index_path.clone() {
        config.index_path = index_path;
    }
    config.validate().map_err(|e| anyhow::anyhow!(e))?;

    let backend = AnthropicClient::new(&config.llm).context("completion backend setup failed")?;
    let mut engine = RagEngine::new(config, Box::new(backend));

    // Prefer the persisted snapshot at startup; rebuild from sources when
    // absent or explicitly requested.
    if args.rebuild {
        let total = engine.rebuild_index()?;
        info!(chunks = total, "index rebuilt at startup");
    } else {
        match engine.load_persisted() {
            Ok(total) => info!(chunks = total, "persisted index loaded"),
            Err(e) => {
                warn!(error = %e, "no persisted index, rebuilding from sources");
                let total = engine.rebuild_index()?;
                info!(chunks = total, "index built at startup");
            }
        }
    }

    let shared: SharedEngine = Arc::new(RwLock::new(engine));
    let app = routes::router(shared)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let listener = tokio::net::TcpListener::bind(&args.bind)
        .await
        .with_context(|| format!("failed to bind {}", args.bind))?;
    info!(addr = %args.bind, "kiwi-api listening");

    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}
