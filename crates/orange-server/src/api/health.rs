//! Health check endpoint

use crate::OrangeServer;
use axum::{
    extract::{Json, State},
    http::StatusCode,
};
use orange_bridge::EngineState;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall health status
    pub status: HealthStatus,
    /// Timestamp of the health check
    pub timestamp: String,
    /// Uptime in seconds
    pub uptime_seconds: u64,
    /// Version information
    pub version: String,
    /// Native engine status
    pub engine: EngineHealth,
}

/// Health status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HealthStatus {
    /// Engine initialized and accepting calls
    Healthy,
    /// Engine not accepting calls
    Unhealthy,
}

/// Engine section of the health report
#[derive(Debug, Serialize, Deserialize)]
pub struct EngineHealth {
    /// Lifecycle state (`loaded`, `initialized`, ...)
    pub state: String,
    /// Where the entry points come from
    pub provider: String,
    /// Whether native calls are serialized
    pub serialized: bool,
}

/// Get health status
pub async fn health_check(
    State(server): State<Arc<OrangeServer>>,
) -> (StatusCode, Json<HealthResponse>) {
    let engine = server.bridge.engine();
    let state = engine.state();

    let (code, status) = if state == EngineState::Initialized {
        (StatusCode::OK, HealthStatus::Healthy)
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, HealthStatus::Unhealthy)
    };

    let response = HealthResponse {
        status,
        timestamp: chrono::Utc::now().to_rfc3339(),
        uptime_seconds: server.started_at.elapsed().as_secs(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        engine: EngineHealth {
            state: state.to_string(),
            provider: engine.description().to_string(),
            serialized: server.bridge.is_serialized(),
        },
    };

    (code, Json(response))
}
