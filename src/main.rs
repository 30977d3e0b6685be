//! DocSearch-RS: a vector search gateway with optional reranking
//!
//! This is the main entry point for the application.

use anyhow::Result;
use clap::Parser;
use docsearch_rs::{
    backends::Pinecone,
    config,
    network::HttpClient,
    web::{create_router, AppState},
};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Command line options
#[derive(Debug, Parser)]
#[command(name = "docsearch-rs", version, about)]
struct Args {
    /// Path to configuration file (overrides DOCSEARCH_SETTINGS_PATH)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Server port
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Backend credential may live in a local .env file
    dotenvy::dotenv().ok();

    let source = config::locate(args.config.as_deref());
    let mut settings = config::load(source.as_deref())?;
    if let Some(port) = args.port {
        settings.server.port = port;
    }

    init_logging(settings.general.debug);
    info!("Starting DocSearch-RS v{}", docsearch_rs::VERSION);
    match source {
        Some(path) => info!("Loaded settings from: {}", path.display()),
        None => info!("No settings file found, using defaults"),
    }

    settings.validate()?;

    // Initialize HTTP client
    let client = HttpClient::with_settings(&settings.backend, &settings.retry)?;
    let pinecone = Arc::new(Pinecone::new(client, &settings));
    info!("Backend client initialized ({})", settings.backend.control_url);

    // Create application state
    let state = AppState::new(settings.clone(), pinecone);

    // Catalog is loaded once per session; searches retry the load if this fails
    match state.catalog().ensure_loaded().await {
        Ok(catalog) => info!("Catalog loaded with {} indexes", catalog.len()),
        Err(e) => error!("Initial catalog discovery failed: {}", e),
    }

    let app = create_router(state);

    // Bind address
    let addr = SocketAddr::new(
        settings.server.bind_address.parse()?,
        settings.server.port,
    );

    info!("Starting server on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_logging(debug: bool) {
    let default_level = if debug { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
