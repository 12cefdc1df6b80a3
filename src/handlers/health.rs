use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use std::time::Instant;

use crate::handlers::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComponentStatus {
    Up,
    Down,
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentHealth {
    pub status: ComponentStatus,
    pub latency_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: ComponentStatus,
    pub version: String,
    pub timestamp: String,
    pub database: ComponentHealth,
}

/// Pings the database; 503 when it cannot be reached.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let start = Instant::now();
    let db_result = crate::db::check_connection(&state.db).await;
    let latency_ms = start.elapsed().as_millis() as u64;

    let (code, status) = match db_result {
        Ok(()) => (StatusCode::OK, ComponentStatus::Up),
        Err(_) => (StatusCode::SERVICE_UNAVAILABLE, ComponentStatus::Down),
    };

    (
        code,
        Json(HealthResponse {
            status: status.clone(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            database: ComponentHealth { status, latency_ms },
        }),
    )
}

pub async fn banner() -> &'static str {
    "coverage-api up"
}
