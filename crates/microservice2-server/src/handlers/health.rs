use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use sqlx::Connection;

use crate::api::{HealthResponse, HealthStatus};
use crate::router::AppState;

/// Healthy when a connection can be opened and closed again, degraded when the
/// database cannot be reached, unhealthy when the check itself fails.
#[tracing::instrument(skip(state))]
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let Some(conn) = state.db.connect().await else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse::new(
                HealthStatus::Degraded,
                "Service is running but database is unavailable",
            )),
        );
    };

    match conn.close().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthResponse::new(HealthStatus::Healthy, "Service is healthy")),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthResponse::new(
                    HealthStatus::Unhealthy,
                    format!("Health check failed: {e}"),
                )),
            )
        }
    }
}
