//! Business services: simulation, ETL and alert aggregation.

pub mod alerts;
pub mod etl;
pub mod loader;
pub mod simulator;
pub mod stores;
pub mod transform;
