#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use coverage_api::{
    config::AppConfig,
    db,
    models::{DayRecordBundle, NewSnapshot, RawRow, Snapshot, ZoneKind, ZoneProfile},
    repositories::{SnapshotRepository, SnapshotStore},
    services::{normalizer, EntryPatchPolicy},
    AppState,
};
use serde_json::Value;
use tower::ServiceExt;

/// Full router over a private in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_policy(EntryPatchPolicy::PassThrough).await
    }

    pub async fn with_policy(policy: EntryPatchPolicy) -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // every pooled connection would otherwise see its own empty database
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.entry_patch_policy = policy;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = coverage_api::app_router(state.clone());
        Self { router, state }
    }

    /// Direct store access for seeding snapshots with chosen timestamps.
    pub fn store(&self) -> SnapshotRepository {
        SnapshotRepository::new(self.state.db.clone())
    }

    pub async fn seed(
        &self,
        kind: ZoneKind,
        rows: &[RawRow],
        created_at: DateTime<Utc>,
    ) -> Snapshot {
        let profile: ZoneProfile = kind.profile();
        let entries = normalizer::normalize(rows, profile.into()).expect("rows normalize");
        self.store()
            .create(NewSnapshot {
                zone_kind: kind,
                entries,
                days: DayRecordBundle::default(),
                created_at,
            })
            .await
            .expect("seed snapshot")
    }

    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    pub async fn request_raw(&self, method: Method, uri: &str, body: &'static str) -> Response {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends the request and returns status plus decoded JSON body (Null when empty).
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, body_json(response).await)
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read body");
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("response body is not JSON")
    }
}
