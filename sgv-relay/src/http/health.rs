//! Health check endpoint.

use crate::server::Relay;
use axum::{Extension, Json};
use serde::Serialize;
use sgv_client::Transport;
use std::sync::Arc;

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status.
    pub status: String,
    /// Daemon version.
    pub version: String,
    /// Uptime in seconds.
    pub uptime_seconds: u64,
    /// Whether the background scheduler is running.
    pub scheduler_running: bool,
}

/// Health check handler.
pub async fn health_handler<T: Transport + 'static>(
    Extension(relay): Extension<Arc<Relay<T>>>,
) -> Json<HealthStatus> {
    Json(HealthStatus {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: relay.uptime_secs(),
        scheduler_running: relay.scheduler_running(),
    })
}
