use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::NaiveDate;
use compute::sync::{ContributionUpdate, ContributionWithType, update_contribution_and_sync};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::helpers::errors::{ApiError, compute_error_response};
use crate::schemas::{ApiResponse, AppState};

/// Request body for updating a contribution; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateContributionRequest {
    /// New amount owed
    #[schema(value_type = Option<f64>)]
    pub amount: Option<Decimal>,
    /// New enrollment start (YYYY-MM-DD)
    pub start_date: Option<NaiveDate>,
    /// New enrollment end (YYYY-MM-DD)
    pub end_date: Option<NaiveDate>,
    /// Move the contribution to another type
    pub contribution_type_id: Option<i32>,
}

impl From<UpdateContributionRequest> for ContributionUpdate {
    fn from(request: UpdateContributionRequest) -> Self {
        Self {
            amount: request.amount,
            start_date: request.start_date,
            end_date: request.end_date,
            contribution_type_id: request.contribution_type_id,
        }
    }
}

/// Contribution response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ContributionResponse {
    pub id: i32,
    pub member_id: i32,
    pub contribution_type_id: i32,
    pub contribution_type_name: String,
    /// Scheduling mode of the type
    pub mode: String,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub amount: Decimal,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<ContributionWithType> for ContributionResponse {
    fn from(synced: ContributionWithType) -> Self {
        let ContributionWithType {
            contribution,
            contribution_type,
        } = synced;
        Self {
            id: contribution.id,
            member_id: contribution.member_id,
            contribution_type_id: contribution.contribution_type_id,
            contribution_type_name: contribution_type.name,
            mode: format!("{:?}", contribution_type.mode),
            amount: contribution.amount,
            start_date: contribution.start_date,
            end_date: contribution.end_date,
        }
    }
}

/// Update a contribution and re-synchronize its schedules, balance and penalties
#[utoipa::path(
    put,
    path = "/api/v1/contributions/{contribution_id}",
    tag = "contributions",
    params(
        ("contribution_id" = i32, Path, description = "Contribution ID"),
    ),
    request_body = UpdateContributionRequest,
    responses(
        (status = 200, description = "Contribution updated and synchronized", body = ApiResponse<ContributionResponse>),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "Contribution or contribution type not found", body = ErrorResponse),
        (status = 500, description = "Synchronization rolled back", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn update_contribution(
    Path(contribution_id): Path<i32>,
    State(state): State<AppState>,
    Json(request): Json<UpdateContributionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ContributionResponse>>), ApiError> {
    trace!("Entering update_contribution function");
    debug!("Updating contribution {} with {:?}", contribution_id, request);

    let synced = update_contribution_and_sync(&state.db, contribution_id, request.into())
        .await
        .map_err(compute_error_response)?;
    state.invalidate_reports();

    info!("Contribution {} updated and synchronized", contribution_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: ContributionResponse::from(synced),
            message: "Contribution updated successfully".to_string(),
            success: true,
        }),
    ))
}
