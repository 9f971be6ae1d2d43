use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::{MonthlySummary, PenaltyMonthlySummary};
use compute::reports::{monthly_contribution_summary, monthly_penalty_summary};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::helpers::errors::{ApiError, compute_error_response};
use crate::schemas::{ApiResponse, AppState, CachedReport};

/// Query parameters for the monthly contribution report
#[derive(Debug, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct MonthlyReportQuery {
    /// Calendar year (e.g., 2024)
    #[validate(range(min = 1900, max = 9999))]
    pub year: i32,
    /// Restrict to one contribution type by name; "Penalty" reports penalty payments
    #[serde(rename = "type")]
    pub contribution_type: Option<String>,
}

/// Query parameters for the monthly penalty report
#[derive(Debug, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct PenaltyReportQuery {
    /// Calendar year (e.g., 2024)
    #[validate(range(min = 1900, max = 9999))]
    pub year: i32,
}

/// Expected vs. paid contributions for each month of a year
#[utoipa::path(
    get,
    path = "/api/v1/reports/monthly",
    tag = "reports",
    params(MonthlyReportQuery),
    responses(
        (status = 200, description = "Monthly report retrieved successfully", body = ApiResponse<Vec<MonthlySummary>>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_monthly_report(
    Valid(Query(query)): Valid<Query<MonthlyReportQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<MonthlySummary>>>), ApiError> {
    trace!("Entering get_monthly_report function");
    let type_name = query
        .contribution_type
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty());
    let cache_key = format!("monthly_{}_{}", query.year, type_name.unwrap_or("*").to_lowercase());

    if let Some(CachedReport::Monthly(rows)) = state.cache.get(&cache_key).await {
        debug!("Serving {} from cache", cache_key);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: rows,
                message: "Monthly report retrieved from cache".to_string(),
                success: true,
            }),
        ));
    }

    let rows = monthly_contribution_summary(&state.db, query.year, type_name)
        .await
        .map_err(compute_error_response)?;
    state
        .cache
        .insert(cache_key, CachedReport::Monthly(rows.clone()))
        .await;

    info!("Monthly report for {} computed", query.year);
    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: rows,
            message: "Monthly report retrieved successfully".to_string(),
            success: true,
        }),
    ))
}

/// Automatic vs. manual penalties for each month of a year
#[utoipa::path(
    get,
    path = "/api/v1/reports/penalties/monthly",
    tag = "reports",
    params(PenaltyReportQuery),
    responses(
        (status = 200, description = "Penalty report retrieved successfully", body = ApiResponse<Vec<PenaltyMonthlySummary>>),
        (status = 400, description = "Invalid query parameters", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_penalty_report(
    Valid(Query(query)): Valid<Query<PenaltyReportQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<Vec<PenaltyMonthlySummary>>>), ApiError> {
    trace!("Entering get_penalty_report function");
    let cache_key = format!("penalties_{}", query.year);

    if let Some(CachedReport::Penalties(rows)) = state.cache.get(&cache_key).await {
        debug!("Serving {} from cache", cache_key);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: rows,
                message: "Penalty report retrieved from cache".to_string(),
                success: true,
            }),
        ));
    }

    let rows = monthly_penalty_summary(&state.db, query.year)
        .await
        .map_err(compute_error_response)?;
    state
        .cache
        .insert(cache_key, CachedReport::Penalties(rows.clone()))
        .await;

    info!("Penalty report for {} computed", query.year);
    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: rows,
            message: "Penalty report retrieved successfully".to_string(),
            success: true,
        }),
    ))
}
