use std::any::Any;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::trace::TraceLayer;

use crate::api::{DbStatusResponse, HealthResponse, HealthStatus};
use crate::db::Database;
use crate::handlers::{db_status, health, info};

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
}

pub fn build(db: Database) -> Router {
    let state = AppState { db };

    let routes = Router::new()
        .route("/", get(info::root))
        .route("/health", get(health::health))
        .route(
            "/db-status",
            get(db_status::db_status).layer(CatchPanicLayer::custom(handle_db_status_panic)),
        )
        .route("/api/service2", get(info::service_info))
        .fallback(not_found)
        .with_state(state);

    with_layers(routes)
}

fn with_layers(router: Router) -> Router {
    router
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
}

async fn not_found() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "not found" })))
}

fn panic_detail(err: Box<dyn Any + Send + 'static>) -> String {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic".to_string()
    };

    tracing::error!(panic = %detail, "handler panicked");
    detail
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic_detail(err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(HealthResponse::new(
            HealthStatus::Unhealthy,
            format!("Request failed: {detail}"),
        )),
    )
        .into_response()
}

/// Panics on `/db-status` keep that endpoint's `database` body shape.
fn handle_db_status_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic_detail(err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(DbStatusResponse::failed(format!("Request failed: {detail}"))),
    )
        .into_response()
}
