use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use sqlx::postgres::PgConnection;
use sqlx::Connection;

use crate::api::DbStatusResponse;
use crate::db::{self, DiagnosticReport};
use crate::router::AppState;

/// Report server version, table count and diagnostic row count.
///
/// Not idempotent: every successful call inserts one row.
#[tracing::instrument(skip(state))]
pub async fn db_status(State(state): State<AppState>) -> (StatusCode, Json<DbStatusResponse>) {
    let Some(conn) = state.db.connect().await else {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(DbStatusResponse::failed("Unable to connect to database")),
        );
    };

    match check(conn).await {
        Ok(report) => {
            tracing::info!(
                tables_count = report.tables_count,
                test_records = report.test_records,
                "database status check passed"
            );
            (StatusCode::OK, Json(DbStatusResponse::connected(report)))
        }
        Err(e) => {
            tracing::error!(error = %e, "database status check failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(DbStatusResponse::failed(e.to_string())),
            )
        }
    }
}

// The connection is dropped without a close handshake if diagnostics fail.
async fn check(mut conn: PgConnection) -> Result<DiagnosticReport, sqlx::Error> {
    let report = db::run_diagnostics(&mut conn).await?;
    conn.close().await?;
    Ok(report)
}
