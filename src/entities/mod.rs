pub mod stock_history;
pub mod store;
