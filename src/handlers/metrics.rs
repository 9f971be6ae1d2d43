use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::Json,
};
use axum_valid::Valid;
use common::MetricCard;
use compute::metrics::{MetricKind, metric_card};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

use crate::helpers::errors::{ApiError, compute_error_response};
use crate::schemas::{ApiResponse, AppState, CachedReport};

/// Query parameters for a metric card
#[derive(Debug, Deserialize, Serialize, ToSchema, IntoParams, Validate)]
pub struct MetricQuery {
    /// One of total_members, new_members, collected_contributions,
    /// collected_penalties, expected_contributions, unpaid_penalties
    #[serde(rename = "type")]
    pub metric_type: String,
    /// Calendar year (e.g., 2024)
    #[validate(range(min = 1900, max = 9999))]
    pub year: i32,
    /// Month (1-12)
    #[validate(range(min = 1, max = 12))]
    pub month: u32,
}

/// Metric value for a month with its change against the previous month
#[utoipa::path(
    get,
    path = "/api/v1/metrics",
    tag = "metrics",
    params(MetricQuery),
    responses(
        (status = 200, description = "Metric computed successfully", body = ApiResponse<MetricCard>),
        (status = 400, description = "Unknown metric type or invalid date", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn get_metric(
    Valid(Query(query)): Valid<Query<MetricQuery>>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<MetricCard>>), ApiError> {
    trace!("Entering get_metric function");
    let kind: MetricKind = query.metric_type.parse().map_err(compute_error_response)?;
    let cache_key = format!("metric_{}_{}_{}", kind, query.year, query.month);

    if let Some(CachedReport::Metric(card)) = state.cache.get(&cache_key).await {
        debug!("Serving {} from cache", cache_key);
        return Ok((
            StatusCode::OK,
            Json(ApiResponse {
                data: card,
                message: "Metric retrieved from cache".to_string(),
                success: true,
            }),
        ));
    }

    let card = metric_card(&state.db, kind, query.year, query.month)
        .await
        .map_err(compute_error_response)?;
    state
        .cache
        .insert(cache_key, CachedReport::Metric(card.clone()))
        .await;

    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: card,
            message: format!("Metric {} computed successfully", kind),
            success: true,
        }),
    ))
}
