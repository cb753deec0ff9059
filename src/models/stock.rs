use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;

/// Assumed units sold per day, used to turn a stock count into days of inventory.
pub const DAILY_SALES_GUESS: f64 = 10.0;

/// Days of inventory below which a product is flagged.
pub const OOS_ALERT_THRESHOLD_DAYS: f64 = 3.0;

/// Shelf state reported for a product at a store.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    DeriveActiveEnum,
    Serialize,
    Deserialize,
    ToSchema,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(8))")]
pub enum StockStatus {
    #[sea_orm(string_value = "full")]
    #[serde(rename = "full")]
    Full,
    #[sea_orm(string_value = "low")]
    #[serde(rename = "low")]
    Low,
    #[sea_orm(string_value = "OOS")]
    #[serde(rename = "OOS")]
    Oos,
}

impl StockStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            StockStatus::Full => "full",
            StockStatus::Low => "low",
            StockStatus::Oos => "OOS",
        }
    }
}

impl fmt::Display for StockStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One simulated reading of a product's stock at a store.
///
/// This is the element type of the batch file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StockObservation {
    #[serde(with = "iso_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub area: String,
    pub store_id: String,
    pub product: String,
    pub stock_status: StockStatus,
    pub stock_count: u32,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

/// An observation with its derived inventory-health fields, ready to be appended
/// to `stock_history`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StockHistoryRecord {
    #[serde(flatten)]
    pub observation: StockObservation,
    pub days_of_inventory: f64,
    pub is_oos_alert: bool,
}

/// ISO-8601 timestamps. Offset-less values (as written by naive local clocks)
/// are read as UTC.
mod iso_timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
            return Ok(parsed.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .map_err(|e| de::Error::custom(format!("invalid timestamp '{raw}': {e}")))
    }
}
