mod api;
mod config;
mod db;
mod error;
mod handlers;
mod router;
mod telemetry;

use tokio::net::TcpListener;
use tokio::signal;

use crate::config::ServerConfig;
use crate::db::Database;
use crate::error::ServerError;

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    let _telemetry = telemetry::init_telemetry();

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "invalid configuration");
            return Err(e.into());
        }
    };
    tracing::debug!(database = ?config.database, "configuration loaded");

    let app = router::build(Database::new(&config.database));

    tracing::info!("Starting microservice2 on {}", config.bind);

    let listener = TcpListener::bind(config.bind).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("microservice2 stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::warn!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::warn!("received SIGTERM, shutting down"),
    }
}
