//! Stockwatch API
//!
//! Simulated retail stock feed, ETL into an append-only `stock_history`
//! table, and per-area out-of-stock alerts served over HTTP.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod models;
pub mod openapi;
pub mod queries;
pub mod services;
pub mod tracing;

use axum::{
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use sea_orm::DatabaseConnection;
use services::{alerts::StockAlertService, etl::EtlService, transform::InventoryHealthPolicy};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub etl_service: EtlService,
    pub alert_service: StockAlertService,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let etl_service = EtlService::new(
            db.clone(),
            config.batch_file.clone(),
            InventoryHealthPolicy::default(),
        );
        let alert_service = StockAlertService::new(db.clone());

        Self {
            db,
            config,
            etl_service,
            alert_service,
        }
    }
}

/// Routes mounted under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/stock", get(handlers::stock::get_area_stock))
        .route("/stores", get(handlers::stock::get_area_stores))
        .route("/process_data", post(handlers::etl::process_data))
}

/// CORS policy from configuration: explicit origins first, then permissive
/// when allowed, otherwise same-origin only.
pub fn cors_layer(cfg: &config::AppConfig) -> CorsLayer {
    let configured_origins: Option<Vec<HeaderValue>> = cfg
        .cors_allowed_origins
        .as_ref()
        .map(|raw| {
            raw.split(',')
                .filter_map(|origin| {
                    let trimmed = origin.trim();
                    if trimmed.is_empty() {
                        None
                    } else {
                        HeaderValue::from_str(trimmed).ok()
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|origins| !origins.is_empty());

    if let Some(origins) = configured_origins {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.should_allow_permissive_cors() {
        ::tracing::info!(
            "Using permissive CORS because explicit origins were not configured ({})",
            if cfg.is_development() {
                "development environment"
            } else {
                "explicit override enabled"
            }
        );
        CorsLayer::permissive()
    } else {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
        CorsLayer::new()
    }
}

/// Full application router with request ids, HTTP tracing and CORS applied.
pub fn app_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/", get(|| async { "stockwatch-api up" }))
        .nest("/api", api_routes())
        .nest("/health", health::health_routes())
        .merge(openapi::openapi_routes::<AppState>())
        .layer(crate::tracing::configure_http_tracing())
        .layer(cors)
        // Outermost, so the trace span and error bodies can see the id
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
        .with_state(state)
}
