use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use common::MaterializeReport;
use compute::default_materializer;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};

use crate::helpers::errors::{ApiError, compute_error_response};
use crate::schemas::{ApiResponse, AppState};

/// Query parameters for a schedule refresh
#[derive(Debug, Default, Deserialize, Serialize, ToSchema, IntoParams)]
pub struct RefreshQuery {
    /// Date to treat as today for open-ended horizons (YYYY-MM-DD), defaults to the current date
    pub today: Option<NaiveDate>,
}

/// Generate missing schedule rows for all active members
#[utoipa::path(
    post,
    path = "/api/v1/schedules/refresh",
    tag = "schedules",
    params(RefreshQuery),
    responses(
        (status = 200, description = "Schedules generated", body = ApiResponse<MaterializeReport>),
        (status = 500, description = "Some insert batches failed; the report lists them", body = ApiResponse<MaterializeReport>)
    )
)]
#[instrument]
pub async fn refresh_schedules(
    Query(query): Query<RefreshQuery>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<MaterializeReport>>), ApiError> {
    trace!("Entering refresh_schedules function");
    debug!("Schedule settings: {:?}, today override: {:?}", state.settings.schedule, query.today);

    let materializer = default_materializer(state.settings.schedule, query.today);
    let report = materializer
        .generate_schedules_for_all_active_members(&state.db)
        .await
        .map_err(compute_error_response)?;

    if report.created > 0 {
        state.invalidate_reports();
    }

    let message = report.summary();
    if report.is_complete() {
        info!("Schedule refresh finished: {}", message);
        Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: report,
                message,
                success: true,
            }),
        ))
    } else {
        error!("Schedule refresh finished with failures: {}", message);
        Ok((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ApiResponse {
                data: report,
                message,
                success: false,
            }),
        ))
    }
}
