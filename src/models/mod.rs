pub mod alerts;
pub mod stock;

pub use alerts::{AreaSummary, DaysOfInventory, ProductSnapshot, StoreListing};
pub use stock::{
    StockHistoryRecord, StockObservation, StockStatus, DAILY_SALES_GUESS,
    OOS_ALERT_THRESHOLD_DAYS,
};
