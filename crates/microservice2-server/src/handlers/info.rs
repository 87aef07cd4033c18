use axum::Json;
use chrono::Utc;

use crate::api::{RootResponse, ServiceInfoResponse, ENDPOINTS, SERVICE_NAME};

pub async fn service_info() -> Json<ServiceInfoResponse> {
    Json(ServiceInfoResponse {
        service: SERVICE_NAME.to_string(),
        message: "Hello from Microservice 2!".to_string(),
        timestamp: Utc::now(),
        endpoints: endpoints(),
    })
}

pub async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        service: SERVICE_NAME.to_string(),
        message: "Microservice 2 is running".to_string(),
        available_endpoints: endpoints(),
    })
}

fn endpoints() -> Vec<String> {
    ENDPOINTS.iter().map(|e| e.to_string()).collect()
}
