//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};

use crate::devices::room::Room;
use crate::sim::commands::Command;
use crate::sim::types::{Snapshot, TickResult};

use super::AppState;
use super::types::{ApiError, TelemetryQuery};

/// `GET /state` → 200 + `Snapshot` JSON
pub async fn get_state(State(state): State<Arc<AppState>>) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.service.snapshot().await?))
}

/// `GET /rooms/{name}` → 200 + `Room` JSON, 404 for an unknown room
pub async fn get_room(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(state.service.room(&name).await?))
}

/// Returns recent tick results, optionally filtered by tick range.
///
/// `GET /telemetry` → 200 + `Vec<TickResult>` JSON
/// `GET /telemetry?from=N&to=M` → filtered range (inclusive)
/// `GET /telemetry?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_telemetry(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TelemetryQuery>,
) -> Result<Json<Vec<TickResult>>, ApiError> {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(u64::MAX);

    if from > to {
        return Err(ApiError::bad_request(format!(
            "`from` ({from}) must be <= `to` ({to})"
        )));
    }

    let records = state
        .service
        .telemetry()
        .await?
        .into_iter()
        .filter(|r| r.tick >= from && r.tick <= to)
        .collect();

    Ok(Json(records))
}

/// Applies a command and returns the updated state.
///
/// `POST /commands` → 200 + `Snapshot` JSON
/// unknown room → 404, missing slot → 422
pub async fn post_command(
    State(state): State<Arc<AppState>>,
    Json(command): Json<Command>,
) -> Result<Json<Snapshot>, ApiError> {
    Ok(Json(state.service.command(command).await?))
}
