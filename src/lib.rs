//! Coverage API library
//!
//! Records planned vs. realized coverage snapshots for three zone kinds and
//! serves their history over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{extract::DefaultBodyLimit, routing::get, Extension, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::models::ZoneKind;

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    /// Builds the services on top of an already migrated connection.
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), config.entry_patch_policy);
        Self {
            db,
            config,
            services,
        }
    }
}

/// `/api/users/*` plus one `/api/{prefix}/*` tree per zone kind
pub fn api_routes() -> Router<AppState> {
    ZoneKind::ALL.into_iter().fold(
        Router::new().nest("/users", handlers::users::users_routes()),
        |api, kind| {
            ::tracing::debug!(prefix = kind.prefix(), "mounting zone routes");
            api.nest(
                &format!("/{}", kind.prefix()),
                handlers::zones::zone_routes().layer(Extension(kind)),
            )
        },
    )
}

/// Full application router with request ids, tracing and the body limit applied.
/// CORS and compression are added by the server binary.
pub fn app_router(state: AppState) -> Router {
    let body_limit = state.config.max_body_size;

    Router::new()
        .route("/", get(handlers::health::banner))
        .route("/health", get(handlers::health::health_check))
        .nest("/api", api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
