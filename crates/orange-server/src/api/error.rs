//! Error responses

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use orange_bridge::Error;
use serde::Serialize;
use tokio::task::JoinError;

/// JSON body of every failed API call
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Human readable message
    pub error: String,
    /// Stable error category
    pub kind: &'static str,
}

/// Failure surfaced by an API handler
#[derive(Debug)]
pub enum ApiError {
    /// The bridge rejected or failed the call
    Bridge(Error),
    /// The blocking task running the native call did not complete
    Task(String),
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Bridge(Error::InvalidArgument(_)) => StatusCode::BAD_REQUEST,
            ApiError::Bridge(Error::NotInitialized) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Bridge(_) | ApiError::Task(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> ErrorResponse {
        match self {
            ApiError::Bridge(e) => ErrorResponse {
                error: e.to_string(),
                kind: e.kind(),
            },
            ApiError::Task(reason) => ErrorResponse {
                error: format!("Engine call failed: {}", reason),
                kind: "engine_call_failure",
            },
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Bridge(e)
    }
}

impl From<JoinError> for ApiError {
    fn from(e: JoinError) -> Self {
        tracing::error!("Blocking engine task failed: {}", e);
        ApiError::Task(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(Error::invalid_argument("statement is empty")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::NotInitialized).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            ApiError::from(Error::engine_call("boom")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::Task("cancelled".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_body_carries_kind() {
        let body = ApiError::from(Error::NotInitialized).body();
        assert_eq!(body.kind, "not_initialized");
        assert!(!body.error.is_empty());

        let body = ApiError::Task("cancelled".into()).body();
        assert_eq!(body.kind, "engine_call_failure");
        assert!(body.error.contains("cancelled"));
    }
}
