//! txrisk API
//!
//! HTTP front end for the analysis pipeline: loads configuration, builds the
//! analyzer context once, persists every verdict, and maps pipeline errors
//! to status codes.

#![warn(missing_docs)]

pub mod config;
pub mod handlers;

use config::{ConfigError, ServiceConfig};
use handlers::{create_router, AppState};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;
use txrisk_analyzer::{AnalysisError, Analyzer, AnalyzerContext};
use txrisk_store::{SqliteStore, StoreError};

/// Default log filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "info,txrisk=debug";

/// Server startup or runtime error
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The analyzer context could not be built
    #[error("Failed to initialize analyzer: {0}")]
    Analyzer(#[from] AnalysisError),

    /// The database could not be opened
    #[error("Failed to open database: {0}")]
    Store(#[from] StoreError),

    /// Server binding error
    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    /// Server error
    #[error("Server error: {0}")]
    Server(String),
}

/// Install the global tracing subscriber (logs to stderr)
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .init();
}

/// Start the HTTP server
///
/// Builds the analyzer context and opens the database, then serves until
/// Ctrl-C. The context is shut down after the server stops.
pub async fn start_server(config: ServiceConfig) -> Result<(), ServerError> {
    config.validate()?;

    info!("Starting txrisk server");
    info!("Database: {}", config.database_path.display());
    info!("Model: {} via {:?}", config.pipeline.llm.model, config.pipeline.llm.provider);

    let context = AnalyzerContext::initialize(&config.pipeline).await?;
    let store = SqliteStore::new(&config.database_path)?;
    let state = AppState::new(Analyzer::new(context.clone()), store);

    let app = create_router(state);

    let listener = TcpListener::bind(&config.bind_addr()).await?;
    info!("Listening on {}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ServerError::Server(e.to_string()))?;

    info!("Server stopped");
    context.shutdown();
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler available; run until the process is killed
        std::future::pending::<()>().await;
    }
}
