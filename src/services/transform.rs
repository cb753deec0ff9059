//! Derives inventory-health fields from raw observations.

use crate::models::{
    StockHistoryRecord, StockObservation, DAILY_SALES_GUESS, OOS_ALERT_THRESHOLD_DAYS,
};

/// The fixed assumptions behind the days-of-inventory metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InventoryHealthPolicy {
    pub daily_sales_guess: f64,
    pub alert_threshold_days: f64,
}

impl Default for InventoryHealthPolicy {
    fn default() -> Self {
        Self {
            daily_sales_guess: DAILY_SALES_GUESS,
            alert_threshold_days: OOS_ALERT_THRESHOLD_DAYS,
        }
    }
}

impl InventoryHealthPolicy {
    pub fn days_of_inventory(&self, stock_count: u32) -> f64 {
        f64::from(stock_count) / self.daily_sales_guess
    }

    /// An empty shelf always alerts, whatever the threshold.
    pub fn is_alert(&self, stock_count: u32, days_of_inventory: f64) -> bool {
        stock_count == 0 || days_of_inventory < self.alert_threshold_days
    }

    pub fn annotate(&self, observation: StockObservation) -> StockHistoryRecord {
        let days_of_inventory = self.days_of_inventory(observation.stock_count);
        let is_oos_alert = self.is_alert(observation.stock_count, days_of_inventory);
        StockHistoryRecord {
            observation,
            days_of_inventory,
            is_oos_alert,
        }
    }
}

/// Annotates every observation of a batch, preserving order.
pub fn transform(
    policy: &InventoryHealthPolicy,
    observations: Vec<StockObservation>,
) -> Vec<StockHistoryRecord> {
    observations
        .into_iter()
        .map(|obs| policy.annotate(obs))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StockStatus;
    use chrono::Utc;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    fn observation(stock_count: u32, status: StockStatus) -> StockObservation {
        StockObservation {
            timestamp: Utc::now(),
            area: "400001".into(),
            store_id: "BLK_MUM_101".into(),
            product: "Mango Oatmeal".into(),
            stock_status: status,
            stock_count,
            price: dec!(199.00),
        }
    }

    #[rstest]
    #[case(0, 0.0, true)]
    #[case(1, 0.1, true)]
    #[case(20, 2.0, true)]
    #[case(29, 2.9, true)]
    #[case(30, 3.0, false)]
    #[case(50, 5.0, false)]
    #[case(100, 10.0, false)]
    fn default_policy_annotations(
        #[case] stock_count: u32,
        #[case] expected_doi: f64,
        #[case] expected_alert: bool,
    ) {
        let record = InventoryHealthPolicy::default().annotate(observation(stock_count, StockStatus::Low));
        assert_eq!(record.days_of_inventory, expected_doi);
        assert_eq!(record.is_oos_alert, expected_alert);
    }

    #[test]
    fn empty_shelf_alerts_even_with_zero_threshold() {
        let policy = InventoryHealthPolicy {
            daily_sales_guess: 10.0,
            alert_threshold_days: 0.0,
        };
        let record = policy.annotate(observation(0, StockStatus::Oos));
        assert!(record.is_oos_alert);
        assert!(!policy.annotate(observation(1, StockStatus::Low)).is_oos_alert);
    }

    #[test]
    fn transform_keeps_order_and_fields() {
        let batch = vec![
            observation(0, StockStatus::Oos),
            observation(64, StockStatus::Full),
        ];
        let records = transform(&InventoryHealthPolicy::default(), batch.clone());

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].observation, batch[0]);
        assert_eq!(records[1].observation, batch[1]);
        assert_eq!(records[1].days_of_inventory, 6.4);
        assert!(!records[1].is_oos_alert);
    }
}
