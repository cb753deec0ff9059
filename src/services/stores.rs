//! Store reference data.

use crate::{entities::store, errors::ServiceError};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, QueryFilter, QueryOrder, Set};
use std::collections::BTreeMap;
use tracing::{info, instrument};

/// Display name given to stores created from configuration.
pub fn default_store_name(store_id: &str) -> String {
    format!("Store {store_id}")
}

/// Inserts every configured store that is not present yet. Existing rows are
/// left alone. Returns the number of stores inserted.
#[instrument(skip(db, areas))]
pub async fn seed_stores<C: ConnectionTrait>(
    db: &C,
    areas: &BTreeMap<String, Vec<String>>,
) -> Result<usize, ServiceError> {
    let mut inserted = 0;

    for (area, store_ids) in areas {
        for store_id in store_ids {
            if store::Entity::find_by_id(store_id.clone())
                .one(db)
                .await?
                .is_some()
            {
                continue;
            }

            store::Entity::insert(store::ActiveModel {
                store_id: Set(store_id.clone()),
                store_name: Set(default_store_name(store_id)),
                area_code: Set(area.clone()),
            })
            .exec_without_returning(db)
            .await?;
            inserted += 1;
        }
    }

    info!(inserted, "stores seeded");
    Ok(inserted)
}

/// Stores of one area, ordered by id.
pub async fn stores_in_area<C: ConnectionTrait>(
    db: &C,
    area_code: &str,
) -> Result<Vec<store::Model>, ServiceError> {
    Ok(store::Entity::find()
        .filter(store::Column::AreaCode.eq(area_code))
        .order_by_asc(store::Column::StoreId)
        .all(db)
        .await?)
}
