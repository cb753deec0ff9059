mod common;

use assert_matches::assert_matches;
use axum::http::Method;
use chrono::Utc;
use rust_decimal_macros::dec;
use sea_orm::{EntityTrait, PaginatorTrait};
use std::collections::BTreeMap;
use stockwatch_api::{
    config::{ProductConfig, SimulatorConfig},
    entities::{stock_history, store},
    errors::ServiceError,
    services::{
        etl::EtlOutcome,
        loader::append_history,
        simulator::{RandomStockSource, Simulator},
        stores::{seed_stores, stores_in_area},
        transform::{transform, InventoryHealthPolicy},
    },
};

use common::{observation, response_json, TestApp};

fn areas() -> BTreeMap<String, Vec<String>> {
    BTreeMap::from([
        (
            "400001".to_string(),
            vec!["BLK_MUM_101".to_string(), "BLK_MUM_102".to_string()],
        ),
        (
            "201301".to_string(),
            vec![
                "BLK_NOI_201".to_string(),
                "BLK_NOI_202".to_string(),
                "BLK_NOI_203".to_string(),
            ],
        ),
    ])
}

#[tokio::test]
async fn failed_batch_leaves_no_rows_behind() {
    let app = TestApp::new().await;
    app.seed_stores(&[("BLK_MUM_101", "400001")]).await;

    let now = Utc::now();
    let mut batch = vec![
        observation("400001", "BLK_MUM_101", 5, now),
        observation("400001", "BLK_MUM_101", 6, now),
    ];
    // Does not fit the INTEGER column, so the second insert fails.
    batch[1].stock_count = u32::MAX;

    let records = transform(&InventoryHealthPolicy::default(), batch);
    let result = append_history(app.state.db.as_ref(), records).await;
    assert_matches!(result, Err(ServiceError::InvalidInput(_)));

    let count = stock_history::Entity::find()
        .count(app.state.db.as_ref())
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn etl_service_reports_outcome() {
    let app = TestApp::new().await;

    let missing = app.state.etl_service.run_and_report().await;
    assert_eq!(missing.outcome, EtlOutcome::BatchMissing);
    assert_eq!(missing.records, 0);

    app.write_batch(&[observation("400001", "BLK_MUM_101", 3, Utc::now())]);
    let loaded = app.state.etl_service.run_and_report().await;
    assert_eq!(loaded.outcome, EtlOutcome::Loaded);
    assert_eq!(loaded.records, 1);
}

#[tokio::test]
async fn seeding_is_idempotent() {
    let app = TestApp::new().await;
    let db = app.state.db.as_ref();

    assert_eq!(seed_stores(db, &areas()).await.unwrap(), 5);
    assert_eq!(seed_stores(db, &areas()).await.unwrap(), 0);
    assert_eq!(store::Entity::find().count(db).await.unwrap(), 5);

    let noida = stores_in_area(db, "201301").await.unwrap();
    let ids: Vec<_> = noida.iter().map(|s| s.store_id.as_str()).collect();
    assert_eq!(ids, vec!["BLK_NOI_201", "BLK_NOI_202", "BLK_NOI_203"]);
    assert_eq!(noida[0].store_name, "Store BLK_NOI_201");
}

#[tokio::test]
async fn simulated_batch_flows_through_to_alerts() {
    let app = TestApp::new().await;
    seed_stores(app.state.db.as_ref(), &areas()).await.unwrap();

    let simulator = Simulator::new(
        RandomStockSource,
        SimulatorConfig {
            interval_secs: 1,
            store_delay_min_ms: 0,
            store_delay_max_ms: 0,
            areas: areas(),
            products: vec![ProductConfig {
                name: "Mango Oatmeal".into(),
                price: dec!(199.00),
            }],
        },
        app.batch_file.clone(),
    );
    let batch = simulator.run_once().await.unwrap();
    assert_eq!(batch.len(), 5);

    let response = app.request(Method::POST, "/api/process_data").await;
    assert_eq!(
        response_json(response).await["message"],
        "Successfully loaded 5 records into stock_history."
    );

    let expected_oos = batch
        .iter()
        .filter(|o| o.area == "201301" && o.stock_count == 0)
        .count();
    let summary = response_json(app.request(Method::GET, "/api/stock?area=201301").await).await;
    assert_eq!(summary["oos_products"], expected_oos as u64);

    let stores = response_json(app.request(Method::GET, "/api/stores?area=201301").await).await;
    let stores = stores.as_array().unwrap();
    assert_eq!(stores.len(), 3);
    assert!(stores
        .iter()
        .all(|s| s["products"].as_array().unwrap().len() == 1));
}

#[tokio::test]
async fn unreachable_database_is_reported_as_connection_error() {
    let app = TestApp::new().await;
    app.write_batch(&[observation("400001", "BLK_MUM_101", 3, Utc::now())]);
    app.close_database().await;

    let response = app.request(Method::POST, "/api/process_data").await;
    assert_eq!(response.status(), 200);
    let message = response_json(response).await["message"]
        .as_str()
        .unwrap()
        .to_string();
    assert!(
        message.starts_with("Database Connection Error: Check DB configuration. Details: "),
        "{message}"
    );
}
