use super::AreaQuery;
use crate::{
    errors::{ErrorResponse, ServiceError},
    models::{AreaSummary, StoreListing},
    AppState,
};
use axum::{
    extract::{RawQuery, State},
    Json,
};
use tracing::instrument;

/// Out-of-stock and low-inventory roll-up for one area
#[utoipa::path(
    get,
    path = "/api/stock",
    params(AreaQuery),
    responses(
        (status = 200, description = "Area summary", body = AreaSummary,
            headers(
                ("X-Request-Id" = String, description = "Unique request id for tracing"),
            )
        ),
        (status = 400, description = "Missing or empty area", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "stock"
)]
#[instrument(skip(state))]
pub async fn get_area_stock(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<AreaSummary>, ServiceError> {
    let query = AreaQuery::from_raw(raw.as_deref());
    let area = query.require_area()?;
    let summary = state.alert_service.area_summary(area).await?;
    Ok(Json(summary))
}

/// Every store of an area with the latest state of its products
#[utoipa::path(
    get,
    path = "/api/stores",
    params(AreaQuery),
    responses(
        (status = 200, description = "Stores of the area", body = [StoreListing]),
        (status = 400, description = "Missing or empty area", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "stock"
)]
#[instrument(skip(state))]
pub async fn get_area_stores(
    State(state): State<AppState>,
    RawQuery(raw): RawQuery,
) -> Result<Json<Vec<StoreListing>>, ServiceError> {
    let query = AreaQuery::from_raw(raw.as_deref());
    let area = query.require_area()?;
    let stores = state.alert_service.stores_for_area(area).await?;
    Ok(Json(stores))
}
