//! Business-plan analysis service (bpa-ai) - Main entry point
//!
//! Serves the analysis pipeline over HTTP: assessment, premium upgrade,
//! competitor discovery, website extraction, section feedback, market
//! estimates, and analysis storage.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use bpa_common::config::{default_database_path, load_or_default, ConfigFileResolver, TomlConfig};
use clap::Parser;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bpa_ai::db::{self, SqliteAnalysisStore};
use bpa_ai::services::{BingSearch, CompletionClient, HttpBrowser};
use bpa_ai::types::WebSearch;
use bpa_ai::{build_router, AppState, Dependencies};

/// Command-line arguments for bpa-ai
#[derive(Parser, Debug)]
#[command(name = "bpa-ai")]
#[command(about = "Business-plan analysis microservice")]
#[command(version)]
struct Args {
    /// Port to listen on (overrides the config file)
    #[arg(short, long, env = "BPA_AI_PORT")]
    port: Option<u16>,

    /// Bootstrap config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// SQLite database for stored analyses
    #[arg(short, long, env = "BPA_DATABASE")]
    database: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config_path = ConfigFileResolver::new("bpa-ai").resolve(args.config.as_deref());
    let config = load_or_default(config_path.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config)?;

    match &config_path {
        Some(path) if path.exists() => info!("Configuration loaded from {}", path.display()),
        Some(path) => warn!("Config file not found at {}, using built-in defaults", path.display()),
        None => warn!("No config location available, using built-in defaults"),
    }

    let port = args.port.unwrap_or(config.port);
    info!("Starting bpa-ai on port {}", port);

    // Credentials: ENV → TOML
    let completion_key = bpa_ai::config::resolve_completion_api_key(&config);
    let search_key = bpa_ai::config::resolve_search_api_key(&config);

    let completion = Arc::new(
        CompletionClient::new(&config.completion, completion_key)
            .context("Failed to initialize completion client")?,
    );
    info!("Completion client ready: {:?}", completion);

    let browser = Arc::new(HttpBrowser::new().context("Failed to initialize browser")?);

    let search: Option<Arc<dyn WebSearch>> = match search_key {
        Some(key) => Some(Arc::new(
            BingSearch::new(&config.search, Some(key)).context("Failed to initialize web search")?,
        )),
        None => {
            info!("Web search disabled, competitor suggestions use the model only");
            None
        }
    };

    let db_path = args
        .database
        .or_else(|| config.database_path.clone())
        .unwrap_or_else(default_database_path);
    info!("Database: {}", db_path.display());
    let pool = db::init_database_pool(&db_path)
        .await
        .context("Failed to initialize database")?;

    let state = AppState::new(
        &config,
        Dependencies {
            completion,
            browser,
            search,
            store: Arc::new(SqliteAnalysisStore::new(pool)),
        },
    );
    if !state.completion_configured {
        warn!(
            "Completion API key not configured; analysis requests will fail with a \
             configuration error"
        );
    }

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server shutdown complete");
    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level for this crate
fn init_tracing(config: &TomlConfig) -> Result<()> {
    let default_filter = format!(
        "bpa_ai={level},bpa_common={level},tower_http=info",
        level = config.logging.level
    );
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    let file_layer = match &config.logging.file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .with(file_layer)
        .init();

    Ok(())
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install terminate handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down");
        },
        _ = terminate => {
            info!("Received terminate signal, shutting down");
        },
    }
}
