use axum::{routing::get, Json, Router};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Stockwatch API",
        description = r#"
Simulated retail stock levels, loaded into an append-only history and rolled
up into per-area out-of-stock alerts.

Errors use one body shape:

```json
{
  "error": "Bad Request",
  "message": "Missing 'area' query parameter.",
  "request_id": "…",
  "timestamp": "2025-10-18T00:00:00Z"
}
```
        "#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:5000", description = "Local development")
    ),
    tags(
        (name = "stock", description = "Area alerts and store listings"),
        (name = "etl", description = "Batch file ingestion")
    ),
    paths(
        crate::handlers::stock::get_area_stock,
        crate::handlers::stock::get_area_stores,
        crate::handlers::etl::process_data,
    ),
    components(
        schemas(
            crate::models::AreaSummary,
            crate::models::StoreListing,
            crate::models::ProductSnapshot,
            crate::models::StockStatus,
            crate::services::etl::EtlReport,
            crate::errors::ErrorResponse
        )
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Serves the generated document at `/api-docs/openapi.json`.
pub fn openapi_routes<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route("/api-docs/openapi.json", get(openapi_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_stock_endpoints() {
        let json = serde_json::to_string(&ApiDoc::openapi()).unwrap();
        assert!(json.contains("Stockwatch API"));
        assert!(json.contains("/api/stock"));
        assert!(json.contains("/api/stores"));
        assert!(json.contains("/api/process_data"));
        assert!(json.contains("ErrorResponse"));
    }
}
