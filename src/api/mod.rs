//! REST API over the live simulation service.
//!
//! - `GET /state`: rooms, temperatures, load, and cost
//! - `GET /rooms/{name}`: one room's device settings
//! - `GET /telemetry`: recent tick results with optional range filtering
//! - `POST /commands`: apply a device-control command

mod handlers;
mod types;

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use tracing::info;

use crate::service::ServiceHandle;

pub use types::{ErrorResponse, TelemetryQuery};

/// Application state shared across all request handlers.
///
/// Holds only a service handle; every read and write goes through the
/// engine task, so no locks are needed here.
pub struct AppState {
    /// Client for the running simulation service.
    pub service: ServiceHandle,
}

/// Builds the axum router with all API routes.
///
/// # Arguments
///
/// * `state` - Shared application state
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/state", get(handlers::get_state))
        .route("/rooms/{name}", get(handlers::get_room))
        .route("/telemetry", get(handlers::get_telemetry))
        .route("/commands", post(handlers::post_command))
        .with_state(state)
}

/// Binds to the given address and serves the API until `shutdown`
/// resolves.
///
/// # Errors
///
/// Returns an `io::Error` if the listener cannot bind or the server fails.
pub async fn serve(
    state: Arc<AppState>,
    addr: SocketAddr,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "API server listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
}
