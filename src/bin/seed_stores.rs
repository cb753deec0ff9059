//! Inserts the stores of every configured area that are not in the database yet.
//!
//! Run with: cargo run --bin seed-stores

use anyhow::Context;
use tracing::info;

use stockwatch_api as api;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = api::config::load_config().context("failed to load configuration")?;
    api::config::init_tracing(cfg.log_level(), cfg.log_json);

    let db = api::db::establish_connection_from_app_config(&cfg).await?;
    if cfg.auto_migrate {
        api::db::run_migrations(&db).await?;
    }

    let inserted = api::services::stores::seed_stores(&db, &cfg.simulator.areas).await?;
    for area in cfg.simulator.areas.keys() {
        let stores = api::services::stores::stores_in_area(&db, area).await?;
        info!(area = %area, stores = stores.len(), "area ready");
    }
    info!(inserted, "store seeding complete");

    api::db::close_pool(db).await?;
    Ok(())
}
