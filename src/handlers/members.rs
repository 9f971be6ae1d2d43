use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use compute::household::PrincipalTransfer;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, trace};
use utoipa::ToSchema;

use crate::helpers::errors::{ApiError, compute_error_response};
use crate::schemas::{ApiResponse, AppState};

/// Principal transfer response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PrincipalTransferResponse {
    pub previous_principal_id: i32,
    pub new_principal_id: i32,
    pub dependents_moved: u64,
    pub contributions_moved: u64,
    pub schedules_moved: u64,
}

impl From<PrincipalTransfer> for PrincipalTransferResponse {
    fn from(transfer: PrincipalTransfer) -> Self {
        Self {
            previous_principal_id: transfer.previous_principal.id,
            new_principal_id: transfer.new_principal.id,
            dependents_moved: transfer.dependents_moved,
            contributions_moved: transfer.contributions_moved,
            schedules_moved: transfer.schedules_moved,
        }
    }
}

/// Hand a departed principal's household over to their spouse
#[utoipa::path(
    post,
    path = "/api/v1/members/{member_id}/transfer-principal",
    tag = "members",
    params(
        ("member_id" = i32, Path, description = "Member ID of the current principal"),
    ),
    responses(
        (status = 200, description = "Principal role transferred", body = ApiResponse<PrincipalTransferResponse>),
        (status = 400, description = "Member or spouse is not eligible", body = ErrorResponse),
        (status = 404, description = "Member not found", body = ErrorResponse),
        (status = 500, description = "Transfer rolled back", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn transfer_principal(
    Path(member_id): Path<i32>,
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<ApiResponse<PrincipalTransferResponse>>), ApiError> {
    trace!("Entering transfer_principal function");

    let transfer = compute::household::transfer_principal(&state.db, member_id)
        .await
        .map_err(compute_error_response)?;
    state.invalidate_reports();

    info!(
        "Member {} is now principal in place of member {}",
        transfer.new_principal.id, transfer.previous_principal.id
    );
    Ok((
        StatusCode::OK,
        Json(ApiResponse {
            data: PrincipalTransferResponse::from(transfer),
            message: "Principal transferred successfully".to_string(),
            success: true,
        }),
    ))
}
