use crate::{services::etl::EtlReport, AppState};
use axum::{extract::State, Json};

/// Loads the simulator's current batch file into `stock_history`.
///
/// Always answers 200; the outcome is described by `message`.
#[utoipa::path(
    post,
    path = "/api/process_data",
    responses(
        (status = 200, description = "ETL outcome", body = EtlReport)
    ),
    tag = "etl"
)]
pub async fn process_data(State(state): State<AppState>) -> Json<EtlReport> {
    Json(state.etl_service.run_and_report().await)
}
