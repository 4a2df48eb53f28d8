//! Engine information endpoint

use super::ApiError;
use crate::OrangeServer;
use axum::extract::{Json, State};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Info response
#[derive(Debug, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Engine description text, verbatim
    pub info: String,
}

/// Return the engine's self-description
pub async fn engine_info(
    State(server): State<Arc<OrangeServer>>,
) -> Result<Json<InfoResponse>, ApiError> {
    let bridge = server.bridge.clone();
    let info = tokio::task::spawn_blocking(move || bridge.fetch_info()).await??;

    Ok(Json(InfoResponse {
        info: info.info_text,
    }))
}
