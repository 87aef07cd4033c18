use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::db::DiagnosticReport;

pub const SERVICE_NAME: &str = "microservice2";

/// Endpoints advertised by `/` and `/api/service2`.
pub const ENDPOINTS: [&str; 3] = ["/health", "/db-status", "/api/service2"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    /// Process is up but the database is not reachable.
    Degraded,
    Unhealthy,
}

/// Response from GET /health
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub service: String,
    pub status: HealthStatus,
    pub timestamp: DateTime<Utc>,
    pub database_connected: bool,
    pub message: String,
}

impl HealthResponse {
    pub fn new(status: HealthStatus, message: impl Into<String>) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            status,
            timestamp: Utc::now(),
            database_connected: status == HealthStatus::Healthy,
            message: message.into(),
        }
    }
}

/// Response from GET /db-status
#[derive(Debug, Serialize)]
pub struct DbStatusResponse {
    pub service: String,
    pub database: DatabaseStatus,
}

/// Failed checks carry only `connected`, `error` and `last_check`.
#[derive(Debug, Serialize)]
pub struct DatabaseStatus {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test_records: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_check: DateTime<Utc>,
}

impl DbStatusResponse {
    pub fn connected(report: DiagnosticReport) -> Self {
        Self::with(DatabaseStatus {
            connected: true,
            version: Some(report.version),
            tables_count: Some(report.tables_count),
            test_records: Some(report.test_records),
            error: None,
            last_check: Utc::now(),
        })
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self::with(DatabaseStatus {
            connected: false,
            version: None,
            tables_count: None,
            test_records: None,
            error: Some(error.into()),
            last_check: Utc::now(),
        })
    }

    fn with(database: DatabaseStatus) -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
            database,
        }
    }
}

/// Response from GET /api/service2
#[derive(Debug, Serialize)]
pub struct ServiceInfoResponse {
    pub service: String,
    pub message: String,
    pub timestamp: DateTime<Utc>,
    pub endpoints: Vec<String>,
}

/// Response from GET /
#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub service: String,
    pub message: String,
    pub available_endpoints: Vec<String>,
}
