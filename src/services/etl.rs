//! Batch-file ETL: read the simulator's output, annotate it, append it to history.

use super::{loader, transform::InventoryHealthPolicy};
use crate::errors::ServiceError;
use sea_orm::DatabaseConnection;
use serde::Serialize;
use std::{path::PathBuf, sync::Arc};
use tracing::{error, info, instrument, warn};
use utoipa::ToSchema;

/// How an ETL run ended. Only the message is returned to HTTP callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtlOutcome {
    Loaded,
    BatchMissing,
    ConnectionFailed,
    Failed,
}

/// Human-readable result of an ETL run
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct EtlReport {
    #[serde(skip)]
    pub outcome: EtlOutcome,
    #[serde(skip)]
    pub records: usize,
    #[schema(example = "Successfully loaded 5 records into stock_history.")]
    pub message: String,
}

impl EtlReport {
    fn from_result(result: Result<usize, ServiceError>) -> Self {
        match result {
            Ok(records) => Self {
                outcome: EtlOutcome::Loaded,
                records,
                message: format!("Successfully loaded {records} records into stock_history."),
            },
            Err(err @ ServiceError::BatchFileNotFound(_)) => Self {
                outcome: EtlOutcome::BatchMissing,
                records: 0,
                message: format!("Error: {err}. Run the simulator first."),
            },
            Err(err) if err.is_connection_error() => Self {
                outcome: EtlOutcome::ConnectionFailed,
                records: 0,
                message: format!(
                    "Database Connection Error: Check DB configuration. Details: {err}"
                ),
            },
            Err(err) => Self {
                outcome: EtlOutcome::Failed,
                records: 0,
                message: format!("ETL Error: {err}"),
            },
        }
    }
}

/// Runs the transform and load steps over the shared batch file.
#[derive(Clone)]
pub struct EtlService {
    db: Arc<DatabaseConnection>,
    batch_file: PathBuf,
    policy: InventoryHealthPolicy,
}

impl EtlService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        batch_file: PathBuf,
        policy: InventoryHealthPolicy,
    ) -> Self {
        Self {
            db,
            batch_file,
            policy,
        }
    }

    /// Loads the current batch file, returning the number of records appended.
    #[instrument(skip(self), fields(batch_file = %self.batch_file.display()))]
    pub async fn run(&self) -> Result<usize, ServiceError> {
        let observations = loader::read_batch_file(&self.batch_file).await?;
        let records = super::transform::transform(&self.policy, observations);
        loader::append_history(&self.db, records).await
    }

    /// Runs the ETL and folds every outcome into a report.
    pub async fn run_and_report(&self) -> EtlReport {
        let report = EtlReport::from_result(self.run().await);
        match report.outcome {
            EtlOutcome::Loaded => info!(records = report.records, "{}", report.message),
            EtlOutcome::BatchMissing => warn!("{}", report.message),
            EtlOutcome::ConnectionFailed | EtlOutcome::Failed => error!("{}", report.message),
        }
        report
    }
}
