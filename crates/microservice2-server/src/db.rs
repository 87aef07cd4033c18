use std::time::Duration;

use opentelemetry::metrics::Counter;
use opentelemetry::{global, KeyValue};
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::Connection;

use crate::config::DatabaseConfig;
use crate::error::ConnectError;

const CREATE_DIAGNOSTIC_TABLE: &str = "CREATE TABLE IF NOT EXISTS service2_test (
    id SERIAL PRIMARY KEY,
    message TEXT,
    created_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
)";

const INSERT_DIAGNOSTIC_ROW: &str =
    "INSERT INTO service2_test (message) VALUES ('Test from microservice2 at ' || CURRENT_TIMESTAMP)";

/// Opens one PostgreSQL connection per call; there is no pool.
#[derive(Clone)]
pub struct Database {
    options: PgConnectOptions,
    connect_timeout: Duration,
    attempts: Counter<u64>,
}

/// Result of a successful status check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticReport {
    pub version: String,
    pub tables_count: i64,
    pub test_records: i64,
}

impl Database {
    /// Build connect options and the attempt counter from `config`.
    ///
    /// Disables `extra_float_digits` startup parameter for PgBouncer compatibility.
    pub fn new(config: &DatabaseConfig) -> Self {
        let options = PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.name)
            .username(&config.user)
            .password(&config.password)
            .application_name("microservice2")
            .extra_float_digits(None);

        let attempts = global::meter("microservice2")
            .u64_counter("db.connection.attempts")
            .with_description("Database connection attempts by outcome")
            .build();

        Self {
            options,
            connect_timeout: config.connect_timeout,
            attempts,
        }
    }

    /// Make a single connection attempt.
    ///
    /// Any failure (refused, auth, DNS, timeout) is logged and reported as
    /// `None`; callers only learn whether the database is reachable.
    #[tracing::instrument(skip(self), fields(host = %self.options.get_host(), port = self.options.get_port()))]
    pub async fn connect(&self) -> Option<PgConnection> {
        match self.try_connect().await {
            Ok(conn) => {
                self.record("ok");
                Some(conn)
            }
            Err(e) => {
                self.record(match e {
                    ConnectError::Timeout(_) => "timeout",
                    ConnectError::Database(_) => "error",
                });
                tracing::error!(error = %e, "database connection failed");
                None
            }
        }
    }

    async fn try_connect(&self) -> Result<PgConnection, ConnectError> {
        let conn = tokio::time::timeout(
            self.connect_timeout,
            PgConnection::connect_with(&self.options),
        )
        .await
        .map_err(|_| ConnectError::Timeout(self.connect_timeout))??;
        Ok(conn)
    }

    fn record(&self, outcome: &'static str) {
        self.attempts.add(1, &[KeyValue::new("outcome", outcome)]);
    }
}

/// Query the server version and table count, then append one row to the
/// diagnostic table (creating it if needed) and count its rows.
///
/// All statements share one transaction; nothing is committed on error.
pub async fn run_diagnostics(conn: &mut PgConnection) -> Result<DiagnosticReport, sqlx::Error> {
    let mut tx = conn.begin().await?;

    let version: String = sqlx::query_scalar("SELECT version()")
        .fetch_one(&mut *tx)
        .await?;

    let tables_count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = 'public'",
    )
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(CREATE_DIAGNOSTIC_TABLE).execute(&mut *tx).await?;
    sqlx::query(INSERT_DIAGNOSTIC_ROW).execute(&mut *tx).await?;

    let test_records: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM service2_test")
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    Ok(DiagnosticReport {
        version,
        tables_count,
        test_records,
    })
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::{Mutex, MutexGuard};
    use std::time::Duration;

    use crate::config::DatabaseConfig;

    static LIVE_DATABASE: Mutex<()> = Mutex::new(());

    /// Serializes tests that write to the shared live database.
    pub fn live_lock() -> MutexGuard<'static, ()> {
        LIVE_DATABASE.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// A database nobody listens on.
    pub fn unreachable_config() -> DatabaseConfig {
        DatabaseConfig {
            host: "127.0.0.1".to_string(),
            port: 1,
            name: "service2_db".to_string(),
            user: "service2_user".to_string(),
            password: "wrong".to_string(),
            connect_timeout: Duration::from_secs(2),
        }
    }

    /// Live database settings from `TEST_DB_*`, used by the ignored tests.
    pub fn live_config() -> DatabaseConfig {
        let var = |key: &str, default: &str| {
            std::env::var(key).unwrap_or_else(|_| default.to_string())
        };
        DatabaseConfig {
            host: var("TEST_DB_HOST", "localhost"),
            port: var("TEST_DB_PORT", "5432").parse().unwrap(),
            name: var("TEST_DB_NAME", "service2_db"),
            user: var("TEST_DB_USER", "postgres"),
            password: var("TEST_DB_PASSWORD", "postgres"),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use super::testing::{live_config, live_lock, unreachable_config};
    use super::*;

    #[tokio::test]
    async fn refused_connection_yields_none() {
        let db = Database::new(&unreachable_config());
        assert!(db.connect().await.is_none());
    }

    #[tokio::test]
    async fn connect_gives_up_after_timeout() {
        let mut config = unreachable_config();
        // TEST-NET-1, never routed.
        config.host = "192.0.2.1".to_string();
        config.port = 5432;
        config.connect_timeout = Duration::from_millis(300);
        let db = Database::new(&config);

        let started = Instant::now();
        assert!(db.connect().await.is_none());
        assert!(started.elapsed() < Duration::from_secs(3));
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (TEST_DB_*)"]
    async fn each_diagnostic_run_adds_one_row() {
        let _guard = live_lock();
        let db = Database::new(&live_config());
        let mut conn = db.connect().await.expect("database reachable");

        let first = run_diagnostics(&mut conn).await.unwrap();
        let second = run_diagnostics(&mut conn).await.unwrap();
        conn.close().await.unwrap();

        assert!(first.version.starts_with("PostgreSQL"));
        assert!(first.test_records >= 1);
        assert_eq!(second.test_records, first.test_records + 1);
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL (TEST_DB_*)"]
    async fn wrong_password_yields_none() {
        let mut config = live_config();
        config.password = "definitely-not-the-password".to_string();
        let db = Database::new(&config);

        assert!(db.connect().await.is_none());
    }
}
