//! API module for the BPMN Registry Server
//!
//! This module contains the API routes and handlers.

use axum::{routing::get, Router};
use std::sync::Arc;

pub mod errors;
pub mod health;
pub mod processes;

use crate::service::RegistryService;

/// Build the router for API endpoints
pub fn build_router(service: Arc<RegistryService>) -> Router {
    Router::new()
        // Process registry
        .route(
            "/api/processes",
            get(processes::list_processes_handler).post(processes::create_process_handler),
        )
        .route(
            "/api/processes/:process_id",
            get(processes::get_process_handler)
                .put(processes::update_process_handler)
                .delete(processes::delete_process_handler),
        )
        .route("/api/processes/:process_id/export", get(processes::export_process_handler))

        // Banner
        .route("/api/", get(health::root))

        // Health check
        .route("/health", get(health::health_check))

        // Shared state
        .with_state(service)
}

pub use errors::ApiError;
