//! HTTP endpoints for the nightsync daemon.
//!
//! Provides a health check plus the manual actions: fetch readings from the
//! source, or run one fetch-and-push cycle right now. Unlike the background
//! scheduler, these report failures to the caller.

pub mod health;

use crate::error::Result;
use crate::server::Relay;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use serde::Serialize;
use sgv_client::{GlucoseSource, SyncReport, Transport};
use sgv_types::Reading;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

pub use health::HealthStatus;

/// Error body returned by the manual actions.
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    /// Human-readable failure.
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorBody>);

fn internal_error(e: impl std::fmt::Display) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorBody {
            error: e.to_string(),
        }),
    )
}

/// Build the HTTP router with all endpoints.
pub fn build_router<T: Transport + 'static>(relay: Arc<Relay<T>>) -> Router {
    Router::new()
        .route("/health", get(health::health_handler::<T>))
        .route("/api/glucose", get(glucose_handler::<T>))
        .route("/api/push", post(push_handler::<T>))
        .layer(Extension(relay))
}

/// Serve the router on `listener` until `shutdown` fires.
pub async fn serve<T: Transport + 'static>(
    relay: Arc<Relay<T>>,
    listener: TcpListener,
    shutdown: CancellationToken,
) -> Result<()> {
    tracing::info!("HTTP endpoints listening on {}", listener.local_addr()?);
    axum::serve(listener, build_router(relay))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await?;
    Ok(())
}

/// Current readings from the source.
async fn glucose_handler<T: Transport + 'static>(
    Extension(relay): Extension<Arc<Relay<T>>>,
) -> std::result::Result<Json<Vec<Reading>>, ApiError> {
    match relay.pipeline().source().fetch().await {
        Ok(readings) => Ok(Json(readings)),
        Err(e) => {
            tracing::error!("Manual fetch failed: {}", e);
            Err(internal_error(e))
        }
    }
}

/// One fetch-and-push cycle.
async fn push_handler<T: Transport + 'static>(
    Extension(relay): Extension<Arc<Relay<T>>>,
) -> std::result::Result<(StatusCode, Json<SyncReport>), ApiError> {
    match relay.pipeline().sync_once().await {
        Ok(report) => {
            tracing::info!(
                fetched = report.fetched,
                pushed = report.pushed,
                "Manual push complete"
            );
            Ok((StatusCode::CREATED, Json(report)))
        }
        Err(e) => {
            tracing::error!("Manual push failed: {}", e);
            Err(internal_error(e))
        }
    }
}
