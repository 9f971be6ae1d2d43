use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use chrono::{NaiveDate, NaiveDateTime, Utc};
use model::entities::penalty::{self, PenaltyOrigin};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;

use crate::helpers::errors::{ApiError, compute_error_response};
use crate::schemas::{ApiResponse, AppState};

/// Penalty response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PenaltyResponse {
    pub id: i32,
    pub member_id: i32,
    pub contribution_id: Option<i32>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub expected_amount: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub paid_amount: Decimal,
    pub missed_month: NaiveDate,
    /// "automatically" or "manually"
    pub generated: String,
    pub waived: bool,
    pub is_paid: bool,
    pub resolved_at: Option<NaiveDateTime>,
}

impl From<penalty::Model> for PenaltyResponse {
    fn from(model: penalty::Model) -> Self {
        Self {
            id: model.id,
            member_id: model.member_id,
            contribution_id: model.contribution_id,
            expected_amount: model.expected_amount,
            paid_amount: model.paid_amount,
            missed_month: model.missed_month,
            generated: match model.generated {
                PenaltyOrigin::Automatically => "automatically",
                PenaltyOrigin::Manually => "manually",
            }
            .to_string(),
            waived: model.waived,
            is_paid: model.is_paid,
            resolved_at: model.resolved_at,
        }
    }
}

/// Waive an unpaid penalty
#[utoipa::path(
    post,
    path = "/api/v1/penalties/{penalty_id}/waive",
    tag = "payments",
    params(
        ("penalty_id" = i32, Path, description = "Penalty ID"),
    ),
    responses(
        (status = 200, description = "Penalty waived", body = ApiResponse<PenaltyResponse>),
        (status = 400, description = "Penalty is already paid or waived", body = ErrorResponse),
        (status = 404, description = "Penalty not found", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn waive_penalty(
    Path(penalty_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<PenaltyResponse>>), ApiError> {
    trace!("Entering waive_penalty function");

    let now = Utc::now().naive_utc();
    let waived = compute::payments::waive_penalty(&state.db, penalty_id, now)
        .await
        .map_err(compute_error_response)?;
    state.invalidate_reports();

    info!("Penalty {} waived", penalty_id);
    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: PenaltyResponse::from(waived),
            message: "Penalty waived successfully".to_string(),
            success: true,
        }),
    ))
}
