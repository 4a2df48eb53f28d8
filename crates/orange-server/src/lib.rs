//! Orange Server - HTTP surface for the Orange DBMS
//!
//! Exposes the native engine through a small REST API and serves the
//! compiled front-end:
//! - POST /api/exec - Run one SQL statement
//! - GET /api/info - Engine information text
//! - GET /health - Liveness and engine state
//! - everything else - Static files with an `index.html` fallback

pub mod api;
pub mod config;

use axum::{
    Router,
    routing::{get, post},
};
use orange_bridge::Bridge;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tower_http::{
    compression::CompressionLayer,
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

/// Shared server state
#[derive(Debug, Clone)]
pub struct OrangeServer {
    /// Bridge into the native engine
    pub bridge: Arc<Bridge>,
    /// Front-end bundle root
    pub dist_dir: PathBuf,
    /// Instant the server state was built, for uptime reporting
    pub started_at: Instant,
}

impl OrangeServer {
    /// Create server state around a ready bridge
    pub fn new(bridge: Arc<Bridge>, dist_dir: impl Into<PathBuf>) -> Self {
        Self {
            bridge,
            dist_dir: dist_dir.into(),
            started_at: Instant::now(),
        }
    }
}

/// Build the application router
pub fn build_router(server: Arc<OrangeServer>) -> Router {
    let assets = frontend_service(&server.dist_dir);

    Router::new()
        .route("/health", get(api::health::health_check))
        .route("/api/exec", post(api::exec::execute))
        .route("/api/info", get(api::info::engine_info))
        .fallback_service(assets)
        .with_state(server)
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

// Unknown paths get `index.html` so client-side routes survive a reload.
fn frontend_service(dist_dir: &Path) -> ServeDir<ServeFile> {
    ServeDir::new(dist_dir).fallback(ServeFile::new(dist_dir.join("index.html")))
}
