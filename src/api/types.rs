//! API query and error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::{Deserialize, Serialize};

use crate::error::SimError;
use crate::service::ServiceError;

/// Optional range query parameters for the telemetry endpoint.
#[derive(Debug, Deserialize)]
pub struct TelemetryQuery {
    /// First tick index (inclusive).
    pub from: Option<u64>,
    /// Last tick index (inclusive).
    pub to: Option<u64>,
}

/// Error response body for 4xx/5xx errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// Handler error carrying its HTTP status.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<ServiceError> for ApiError {
    fn from(err: ServiceError) -> Self {
        let status = match &err {
            ServiceError::Sim(SimError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServiceError::Sim(SimError::InvalidSlot { .. }) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::Stopped => StatusCode::SERVICE_UNAVAILABLE,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(ErrorResponse {
                error: self.message,
            }),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sim_errors_map_to_statuses() {
        let not_found = ApiError::from(ServiceError::Sim(SimError::NotFound("Attic".into())));
        assert_eq!(not_found.status, StatusCode::NOT_FOUND);
        assert!(not_found.message.contains("Attic"));

        let invalid = ApiError::from(ServiceError::Sim(SimError::InvalidSlot {
            room: "Toilet".into(),
            slot: "tv".into(),
        }));
        assert_eq!(invalid.status, StatusCode::UNPROCESSABLE_ENTITY);

        let stopped = ApiError::from(ServiceError::Stopped);
        assert_eq!(stopped.status, StatusCode::SERVICE_UNAVAILABLE);
    }
}
