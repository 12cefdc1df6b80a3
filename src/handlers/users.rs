use axum::{
    extract::{rejection::JsonRejection, State},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{
    errors::ApiError,
    handlers::{
        common::{created_response, map_service_error, success_response},
        AppState,
    },
    services::Credential,
};

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub message: String,
    pub role: String,
    pub user: Credential,
}

impl UserResponse {
    fn new(message: &str, user: Credential) -> Self {
        Self {
            message: message.to_string(),
            role: user.role.clone(),
            user,
        }
    }
}

async fn create_user(
    State(state): State<AppState>,
    body: Result<Json<CreateUserRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let user = state
        .services
        .credentials
        .create_if_absent(&req.username, &req.password, &req.role)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(UserResponse::new(
        "User created successfully",
        user,
    )))
}

async fn login(
    State(state): State<AppState>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let user = state
        .services
        .credentials
        .verify(&req.username, &req.password)
        .await
        .map_err(map_service_error)?;

    info!(username = %user.username, "Login successful");
    Ok(success_response(UserResponse::new("Login successful", user)))
}

/// Snapshots of every zone kind, newest first; each carries its `zoneKind`.
async fn all_zones(State(state): State<AppState>) -> Result<Response, ApiError> {
    let snapshots = state
        .services
        .snapshots
        .list_all_zones()
        .await
        .map_err(map_service_error)?;
    Ok(success_response(snapshots))
}

pub fn users_routes() -> Router<AppState> {
    Router::new()
        .route("/create", post(create_user))
        .route("/login", post(login))
        .route("/all-zones", get(all_zones))
}
