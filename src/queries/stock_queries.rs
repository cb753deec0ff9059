//! Reads over the latest record of every (store, product) pair.
//!
//! "Latest" is the highest `timestamp` within the pair, ties broken by insertion
//! order, selected with a `ROW_NUMBER()` window rather than a current-state table.

use super::Query;
use crate::errors::ServiceError;
use async_trait::async_trait;
use sea_orm::{ConnectionTrait, DatabaseConnection, DbBackend, FromQueryResult, Statement};
use serde::{Deserialize, Serialize};

/// Positional parameter marker for the connection's SQL dialect.
fn param(backend: DbBackend, index: usize) -> String {
    match backend {
        DbBackend::Postgres => format!("${index}"),
        DbBackend::MySql | DbBackend::Sqlite => "?".to_string(),
    }
}

fn latest_stock_cte(backend: DbBackend, area_param: usize) -> String {
    format!(
        r#"latest_stock AS (
            SELECT
                sh.store_id,
                sh.product_name,
                sh.stock_status,
                sh.days_of_inventory,
                sh.is_oos_alert,
                ROW_NUMBER() OVER (
                    PARTITION BY sh.store_id, sh.product_name
                    ORDER BY sh.timestamp DESC, sh.id DESC
                ) AS rn
            FROM stock_history sh
            JOIN stores s ON sh.store_id = s.store_id
            WHERE s.area_code = {}
        )"#,
        param(backend, area_param)
    )
}

/// Status and alert flag of one latest record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
pub struct LatestAlertRow {
    pub store_id: String,
    pub product_name: String,
    pub stock_status: String,
    pub is_oos_alert: bool,
}

/// Latest records of every (store, product) pair of an area
#[derive(Debug, Serialize, Deserialize)]
pub struct LatestAlertsForAreaQuery {
    pub area_code: String,
}

#[async_trait]
impl Query for LatestAlertsForAreaQuery {
    type Result = Vec<LatestAlertRow>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let backend = db_pool.get_database_backend();
        let sql = format!(
            r#"WITH {}
            SELECT store_id, product_name, stock_status, is_oos_alert
            FROM latest_stock
            WHERE rn = 1
            ORDER BY store_id, product_name"#,
            latest_stock_cte(backend, 1)
        );
        let stmt =
            Statement::from_sql_and_values(backend, sql, vec![self.area_code.clone().into()]);

        LatestAlertRow::find_by_statement(stmt)
            .all(db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}

/// One row of the stores ⟕ latest-records join. Product columns are null for a
/// store without history.
#[derive(Debug, Clone, PartialEq, Serialize, FromQueryResult)]
pub struct StoreListingRow {
    pub store_id: String,
    pub store_name: String,
    pub product_name: Option<String>,
    pub stock_status: Option<String>,
    pub days_of_inventory: Option<f64>,
}

/// Every store of an area with its latest product records
#[derive(Debug, Serialize, Deserialize)]
pub struct StoreListingForAreaQuery {
    pub area_code: String,
}

#[async_trait]
impl Query for StoreListingForAreaQuery {
    type Result = Vec<StoreListingRow>;

    async fn execute(&self, db_pool: &DatabaseConnection) -> Result<Self::Result, ServiceError> {
        let backend = db_pool.get_database_backend();
        let sql = format!(
            r#"WITH {}
            SELECT
                s.store_id,
                s.store_name,
                ls.product_name,
                ls.stock_status,
                CAST(ls.days_of_inventory AS DOUBLE PRECISION) AS days_of_inventory
            FROM stores s
            LEFT JOIN latest_stock ls ON s.store_id = ls.store_id AND ls.rn = 1
            WHERE s.area_code = {}
            ORDER BY s.store_id, ls.product_name"#,
            latest_stock_cte(backend, 1),
            param(backend, 2)
        );
        let stmt = Statement::from_sql_and_values(
            backend,
            sql,
            vec![self.area_code.clone().into(), self.area_code.clone().into()],
        );

        StoreListingRow::find_by_statement(stmt)
            .all(db_pool)
            .await
            .map_err(ServiceError::DatabaseError)
    }
}
