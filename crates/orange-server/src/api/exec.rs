//! Statement execution endpoint

use super::ApiError;
use crate::OrangeServer;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Execute request
#[derive(Debug, Deserialize)]
pub struct ExecRequest {
    /// SQL statement handed to the engine verbatim
    pub sql: String,
}

/// Execute response
#[derive(Debug, Serialize, Deserialize)]
pub struct ExecResponse {
    /// Seconds spent inside the engine call
    pub time: f64,
    /// Engine output text
    pub results: String,
}

/// Run one statement through the engine.
///
/// The native call blocks, so it runs on the blocking pool and never
/// parks an async worker.
pub async fn execute(
    State(server): State<Arc<OrangeServer>>,
    Json(request): Json<ExecRequest>,
) -> Result<Json<ExecResponse>, ApiError> {
    tracing::debug!("Executing statement ({} bytes)", request.sql.len());

    let bridge = server.bridge.clone();
    let result = tokio::task::spawn_blocking(move || bridge.run_query(&request.sql)).await??;

    Ok(Json(ExecResponse {
        time: result.elapsed_seconds,
        results: result.result_text,
    }))
}
