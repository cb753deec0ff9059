use serde::{Serialize, Serializer};
use utoipa::ToSchema;

/// Alert roll-up for one area, computed over the latest record of every
/// (store, product) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AreaSummary {
    #[schema(example = "400001")]
    pub area: String,
    /// Latest records whose status is `OOS`
    #[schema(example = 1)]
    pub oos_products: u64,
    /// `"Low in {n} store(s)"`, or `"None"`
    #[schema(example = "Low in 1 store(s)")]
    pub doi_alert: String,
}

/// A store of an area together with the latest state of each of its products.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct StoreListing {
    #[schema(example = "BLK_MUM_101")]
    pub store_id: String,
    pub store_name: String,
    pub products: Vec<ProductSnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct ProductSnapshot {
    pub name: String,
    #[schema(example = "low")]
    pub status: String,
    /// Days of inventory, or `"N/A"` when none was recorded
    #[schema(value_type = Object, example = 0.7)]
    pub doi: DaysOfInventory,
}

/// Days of inventory as shown to the front-end.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DaysOfInventory {
    Days(f64),
    NotAvailable,
}

impl From<Option<f64>> for DaysOfInventory {
    fn from(value: Option<f64>) -> Self {
        value.map_or(DaysOfInventory::NotAvailable, DaysOfInventory::Days)
    }
}

impl Serialize for DaysOfInventory {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            DaysOfInventory::Days(days) => serializer.serialize_f64(*days),
            DaysOfInventory::NotAvailable => serializer.serialize_str("N/A"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn doi_serializes_number_or_sentinel() {
        assert_eq!(
            serde_json::to_value(DaysOfInventory::from(Some(2.5))).unwrap(),
            json!(2.5)
        );
        assert_eq!(
            serde_json::to_value(DaysOfInventory::from(None)).unwrap(),
            json!("N/A")
        );
    }
}
