use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// Why a connection attempt produced no connection.
#[derive(Error, Debug)]
pub enum ConnectError {
    #[error(transparent)]
    Database(#[from] sqlx::Error),

    #[error("connection attempt timed out after {0:?}")]
    Timeout(Duration),
}

/// Fatal startup and serve errors surfaced from `main`.
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
#[error("failed to build OTLP {signal} exporter: {source}")]
pub struct TelemetryError {
    signal: &'static str,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
}

impl TelemetryError {
    pub fn exporter<E>(signal: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            signal,
            source: Box::new(source),
        }
    }
}
