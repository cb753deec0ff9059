#![allow(dead_code)]

use std::{path::PathBuf, sync::Arc};

use axum::{
    body::{self, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::{DateTime, Utc};
use rust_decimal_macros::dec;
use serde_json::Value;
use stockwatch_api::{
    config::AppConfig,
    db,
    entities::store,
    models::{StockObservation, StockStatus},
    AppState,
};
use sea_orm::{EntityTrait, Set};
use tempfile::TempDir;
use tower::ServiceExt;

/// Application state backed by a throwaway SQLite file, with the router the
/// binary serves.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    pub batch_file: PathBuf,
    _dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with a fresh, migrated database.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_path = dir.path().join("stockwatch_test.db");
        let batch_file = dir.path().join("stock_data.json");

        let mut cfg = AppConfig::new(
            Some(format!("sqlite://{}?mode=rwc", db_path.display())),
            "127.0.0.1".to_string(),
            0,
            "test".to_string(),
        );
        cfg.auto_migrate = true;
        cfg.cors_allow_any_origin = true;
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;
        cfg.batch_file = batch_file.clone();

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(Arc::new(pool), cfg);
        let router = stockwatch_api::app_router(state.clone());

        Self {
            router,
            state,
            batch_file,
            _dir: dir,
        }
    }

    /// Inserts reference stores as `(store_id, area_code)` pairs.
    pub async fn seed_stores(&self, stores: &[(&str, &str)]) {
        for (store_id, area) in stores {
            store::Entity::insert(store::ActiveModel {
                store_id: Set(store_id.to_string()),
                store_name: Set(format!("Store {store_id}")),
                area_code: Set(area.to_string()),
            })
            .exec_without_returning(self.state.db.as_ref())
            .await
            .expect("seed store");
        }
    }

    /// Closes the shared pool, so every later acquire fails the way an
    /// unreachable database does.
    pub async fn close_database(&self) {
        db::close_pool(self.state.db.as_ref().clone())
            .await
            .expect("close pool");
    }

    /// Replaces the batch file with `observations`.
    pub fn write_batch(&self, observations: &[StockObservation]) {
        let bytes = serde_json::to_vec(observations).expect("serialize batch");
        std::fs::write(&self.batch_file, bytes).expect("write batch file");
    }

    /// Writes `observations` as the batch and loads it through the HTTP endpoint.
    pub async fn load_batch(&self, observations: &[StockObservation]) -> Value {
        self.write_batch(observations);
        let response = self.request(Method::POST, "/api/process_data").await;
        assert_eq!(response.status(), 200);
        response_json(response).await
    }

    /// Send a request without a body against the router.
    pub async fn request(&self, method: Method, uri: &str) -> Response {
        self.request_with_headers(method, uri, &[]).await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        headers: &[(&str, &str)],
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }

        let request = builder.body(Body::empty()).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

pub async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

/// An observation of "Mango Oatmeal" with a status consistent with `count`.
pub fn observation(area: &str, store_id: &str, count: u32, at: DateTime<Utc>) -> StockObservation {
    let stock_status = match count {
        0 => StockStatus::Oos,
        1..=15 => StockStatus::Low,
        _ => StockStatus::Full,
    };
    StockObservation {
        timestamp: at,
        area: area.to_string(),
        store_id: store_id.to_string(),
        product: "Mango Oatmeal".to_string(),
        stock_status,
        stock_count: count,
        price: dec!(199.00),
    }
}
