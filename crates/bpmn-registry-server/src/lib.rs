//!
//! BPMN Registry Server - REST API for storing and exporting BPMN process definitions
//!
//! This module exports all the components of the server.

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, error, info};

/// API module
pub mod api;

/// Configuration module
pub mod config;

/// Error module
pub mod error;

/// Registry service module
pub mod service;

// Re-export key types
pub use config::{LogFormat, ServerConfig};
pub use error::{ServerError, ServerResult};
pub use service::{
    NewProcess, ProcessExport, ProcessPatch, RegistryError, RegistryResult, RegistryService,
};
pub use bpmn_registry_store::{Process, ProcessStore};

/// Run the server until a shutdown signal arrives.
///
/// The process store is opened once here and closed once after the HTTP
/// server has drained.
pub async fn run(config: ServerConfig) -> ServerResult<()> {
    // Initialize logging
    init_logging(&config);

    // Create dependencies
    let store = bpmn_registry_store::connect(&config.store_url, config.store_max_connections).await?;
    let service = Arc::new(RegistryService::new(store.clone()));
    let app = build_app(service, &config);

    // Create and bind the TCP listener
    let listener = TcpListener::bind((config.bind_address.as_str(), config.port)).await?;
    info!("Listening on {}", listener.local_addr()?);

    // Run server
    let served = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await;

    info!("Server stopped, closing process store");
    store.close().await;

    served?;
    Ok(())
}

/// Build the full application: API routes plus HTTP middleware
pub fn build_app(service: Arc<RegistryService>, config: &ServerConfig) -> Router {
    let router = api::build_router(service).layer(TraceLayer::new_for_http());

    if config.cors_permissive {
        router.layer(CorsLayer::very_permissive())
    } else {
        router
    }
}

/// Initialize logging
///
/// `RUST_LOG` takes precedence over the configured level. Safe to call more
/// than once; later calls are ignored.
pub fn init_logging(config: &ServerConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    // Create filter based on config
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    // Initialize subscriber
    let result = match config.log_format {
        LogFormat::Json => fmt()
            .json()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
        LogFormat::Text => fmt()
            .with_env_filter(filter)
            .with_target(true)
            .try_init(),
    };

    if result.is_err() {
        debug!("Logging already initialized");
    }
}

/// Resolves on Ctrl-C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "Failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
