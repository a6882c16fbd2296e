//! Q&A server binary
//!
//! Run with: GEMINI_API_KEY=... cargo run -p lexrag --bin lexrag-server

use clap::Parser;
use lexrag::{config::RagConfig, server::RagServer};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "lexrag-server", version, about = "Document Q&A server")]
struct Args {
    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lexrag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = RagConfig::load(args.config.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Model: {}", config.llm.model);
    tracing::info!("  - Max attempts: {}", config.llm.max_attempts);
    tracing::info!("  - Top k: {}", config.retrieval.top_k);
    tracing::info!(
        "  - Parallel files: {}",
        config.processing.effective_parallel_files()
    );

    let server = RagServer::new(config)?;

    println!("\nServer starting...");
    println!("  API: http://{}", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/ingest    - Upload documents");
    println!("  GET  /api/jobs/:id  - Batch progress");
    println!("  POST /api/query     - Ask questions");
    println!("  GET  /api/documents - List documents");
    println!("  POST /api/reset     - Clear all documents");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
