//! Error types for the snapshot engine
//!
//! Provides unified error handling using thiserror.

use std::time::Duration;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// == Engine Error Enum ==
/// Unified error type for the snapshot engine and its HTTP surface.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// Store connection is absent or was lost
    #[error("No connection to the store")]
    NoConnection,

    /// A key's type or value could not be decoded
    #[error("Value missing: {0}")]
    ValueMissing(String),

    /// The poll, or a single store command, did not finish in time.
    /// Carries the poll bound when that is what expired.
    #[error("{}", describe_timeout(.0))]
    Timeout(Option<Duration>),

    /// Another snapshot is already in flight
    #[error("A snapshot is already in progress")]
    Busy,

    /// Invalid request data
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Anything else
    #[error("Internal error: {0}")]
    Other(String),
}

fn describe_timeout(bound: &Option<Duration>) -> String {
    match bound {
        Some(bound) => format!("Snapshot timed out after {:?}", bound),
        None => "Store command timed out".to_string(),
    }
}

impl EngineError {
    /// Returns true for errors confined to a single key.
    ///
    /// Everything else (connection loss, timeouts) invalidates the whole poll.
    pub fn is_per_key(&self) -> bool {
        matches!(self, EngineError::ValueMissing(_))
    }
}

// == Redis Error Conversion ==
impl From<redis::RedisError> for EngineError {
    fn from(err: redis::RedisError) -> Self {
        // Timeouts surface as I/O errors, so they are checked first
        if err.is_timeout() {
            EngineError::Timeout(None)
        } else if err.is_connection_refusal() || err.is_connection_dropped() || err.is_io_error() {
            EngineError::NoConnection
        } else if err.kind() == redis::ErrorKind::TypeError || err.code() == Some("WRONGTYPE") {
            EngineError::ValueMissing(err.to_string())
        } else {
            EngineError::Other(err.to_string())
        }
    }
}

// == IntoResponse Implementation ==
impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        let status = match &self {
            EngineError::NoConnection => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::ValueMissing(_) => StatusCode::BAD_GATEWAY,
            EngineError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            EngineError::Busy => StatusCode::CONFLICT,
            EngineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            EngineError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse::new(self.to_string()));

        (status, body).into_response()
    }
}

// == Result Type Alias ==
/// Convenience Result type for the snapshot engine.
pub type Result<T> = std::result::Result<T, EngineError>;
