//! Appends transformed records to `stock_history`.

use crate::{
    entities::stock_history,
    errors::ServiceError,
    models::{StockHistoryRecord, StockObservation},
};
use sea_orm::{ActiveValue::NotSet, ConnectionTrait, DatabaseConnection, EntityTrait, Set, TransactionTrait};
use std::path::Path;
use tracing::{debug, info, instrument};

/// Reads the simulator's batch file.
///
/// A missing file is reported as [`ServiceError::BatchFileNotFound`].
pub async fn read_batch_file(path: &Path) -> Result<Vec<StockObservation>, ServiceError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ServiceError::BatchFileNotFound(path.to_path_buf()))
        }
        Err(e) => return Err(ServiceError::Io(e)),
    };
    let observations: Vec<StockObservation> = serde_json::from_slice(&bytes)?;
    debug!(records = observations.len(), path = %path.display(), "read batch file");
    Ok(observations)
}

fn to_active_model(record: &StockHistoryRecord) -> Result<stock_history::ActiveModel, ServiceError> {
    let obs = &record.observation;
    let stock_count = i32::try_from(obs.stock_count).map_err(|_| {
        ServiceError::InvalidInput(format!(
            "stock_count {} for store {} is out of range",
            obs.stock_count, obs.store_id
        ))
    })?;

    Ok(stock_history::ActiveModel {
        id: NotSet,
        timestamp: Set(obs.timestamp),
        store_id: Set(obs.store_id.clone()),
        product_name: Set(obs.product.clone()),
        stock_status: Set(obs.stock_status),
        stock_count: Set(stock_count),
        price: Set(obs.price),
        days_of_inventory: Set(record.days_of_inventory),
        is_oos_alert: Set(record.is_oos_alert),
    })
}

async fn insert_records<C>(conn: &C, records: &[StockHistoryRecord]) -> Result<usize, ServiceError>
where
    C: ConnectionTrait,
{
    for record in records {
        stock_history::Entity::insert(to_active_model(record)?)
            .exec(conn)
            .await?;
    }
    Ok(records.len())
}

/// Inserts a batch as new history rows inside one transaction.
///
/// Either every record is persisted or none is. Existing rows are never touched.
#[instrument(skip(db, records), fields(records = records.len()))]
pub async fn append_history(
    db: &DatabaseConnection,
    records: Vec<StockHistoryRecord>,
) -> Result<usize, ServiceError> {
    if records.is_empty() {
        return Ok(0);
    }

    let inserted = db
        .transaction::<_, usize, ServiceError>(|txn| {
            Box::pin(async move { insert_records(txn, &records).await })
        })
        .await
        .map_err(|e| match e {
            sea_orm::TransactionError::Connection(e) => ServiceError::DatabaseError(e),
            sea_orm::TransactionError::Transaction(e) => e,
        })?;

    info!(records = inserted, "appended stock history");
    Ok(inserted)
}
