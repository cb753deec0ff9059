//! Area-level alert summaries and per-store product listings.

use crate::{
    errors::ServiceError,
    models::{AreaSummary, DaysOfInventory, ProductSnapshot, StockStatus, StoreListing},
    queries::{
        stock_queries::{
            LatestAlertRow, LatestAlertsForAreaQuery, StoreListingForAreaQuery, StoreListingRow,
        },
        Query,
    },
};
use sea_orm::DatabaseConnection;
use std::{collections::HashMap, sync::Arc};
use tracing::{debug, instrument};

/// Renders the low-inventory count the way the front-end displays it.
pub fn doi_alert_message(count: u64) -> String {
    if count > 0 {
        format!("Low in {count} store(s)")
    } else {
        "None".to_string()
    }
}

/// Rolls latest records up into an area summary.
///
/// A record is either out of stock or, failing that, counted as a
/// days-of-inventory alert when flagged; never both.
pub fn summarize_area(area: &str, latest: &[LatestAlertRow]) -> AreaSummary {
    let (oos, rest): (Vec<_>, Vec<_>) = latest
        .iter()
        .partition(|row| row.stock_status == StockStatus::Oos.as_str());
    let doi_alerts = rest.iter().filter(|row| row.is_oos_alert).count() as u64;

    AreaSummary {
        area: area.to_string(),
        oos_products: oos.len() as u64,
        doi_alert: doi_alert_message(doi_alerts),
    }
}

/// Groups joined rows into one entry per store, keeping first-seen store order.
pub fn group_store_listing(rows: Vec<StoreListingRow>) -> Vec<StoreListing> {
    let mut listings: Vec<StoreListing> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let slot = *index.entry(row.store_id.clone()).or_insert_with(|| {
            listings.push(StoreListing {
                store_id: row.store_id.clone(),
                store_name: row.store_name.clone(),
                products: Vec::new(),
            });
            listings.len() - 1
        });

        let Some(name) = row.product_name.filter(|name| !name.is_empty()) else {
            continue;
        };
        listings[slot].products.push(ProductSnapshot {
            name,
            status: row.stock_status.unwrap_or_default(),
            doi: DaysOfInventory::from(row.days_of_inventory),
        });
    }

    listings
}

/// Read side of the stock history
#[derive(Clone)]
pub struct StockAlertService {
    db: Arc<DatabaseConnection>,
}

impl StockAlertService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn area_summary(&self, area: &str) -> Result<AreaSummary, ServiceError> {
        let latest = LatestAlertsForAreaQuery {
            area_code: area.to_string(),
        }
        .execute(&self.db)
        .await?;
        debug!(records = latest.len(), "latest records for area");
        Ok(summarize_area(area, &latest))
    }

    #[instrument(skip(self))]
    pub async fn stores_for_area(&self, area: &str) -> Result<Vec<StoreListing>, ServiceError> {
        let rows = StoreListingForAreaQuery {
            area_code: area.to_string(),
        }
        .execute(&self.db)
        .await?;
        Ok(group_store_listing(rows))
    }
}
