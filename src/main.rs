// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::application::machine_service::MachineService;
use crate::application::monitor_service::MonitorService;
use crate::infrastructure::config::{load_catalog_config, load_server_config};
use crate::infrastructure::static_catalog::StaticCatalog;
use crate::presentation::app_state::AppState;
use crate::presentation::handlers::{
    create_session, delete_session, export_session_csv, export_session_json, get_session,
    health_check, list_machines, machine_readings, machine_series, refresh_session, session_series,
    start_live, stop_live, stream_session, update_session,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    // Load configuration
    let server_config = load_server_config()?;
    let catalog_config = load_catalog_config()?;
    tracing::info!("loaded {} machines into the catalog", catalog_config.machines.len());

    // Create catalog (infrastructure layer)
    let catalog = Arc::new(StaticCatalog::new(catalog_config));

    // Create services (application layer)
    let machine_service = MachineService::new(catalog.clone());
    let monitor_service = MonitorService::new(catalog.clone());

    // Create application state
    let state = Arc::new(AppState {
        machine_service,
        monitor_service,
    });

    // Build router (presentation layer)
    // Note: Export downloads handle Brotli themselves, so no CompressionLayer
    // here to avoid double compression
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/machines", get(list_machines))
        .route("/machines/:id/readings", get(machine_readings))
        .route("/machines/:id/series", get(machine_series))
        .route("/sessions", post(create_session))
        .route(
            "/sessions/:id",
            get(get_session).put(update_session).delete(delete_session),
        )
        .route("/sessions/:id/series", get(session_series))
        .route("/sessions/:id/refresh", post(refresh_session))
        .route("/sessions/:id/live/start", post(start_live))
        .route("/sessions/:id/live/stop", post(stop_live))
        .route("/sessions/:id/stream", get(stream_session))
        .route("/sessions/:id/export/csv", get(export_session_csv))
        .route("/sessions/:id/export/json", get(export_session_json))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    // Start server
    let addr: SocketAddr =
        format!("{}:{}", server_config.server.host, server_config.server.port).parse()?;
    println!("Starting machine-telemetry service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
