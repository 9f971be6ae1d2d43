use axum::{extract::State, http::StatusCode, response::Json};
use chrono::NaiveDate;
use compute::payments::NewPayment;
use model::entities::payment::{self, PaymentType};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, trace};
use utoipa::ToSchema;

use crate::helpers::errors::{ApiError, compute_error_response};
use crate::schemas::{ApiResponse, AppState};

/// Request body for recording a payment; set exactly one of `schedule_id` or `penalty_id`
#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct RecordPaymentRequest {
    /// Schedule month being paid
    pub schedule_id: Option<i32>,
    /// Penalty being paid
    pub penalty_id: Option<i32>,
    /// Amount received, must be positive
    #[schema(value_type = f64)]
    pub amount: Decimal,
    /// Date the money was received (YYYY-MM-DD)
    pub payment_date: NaiveDate,
}

/// Payment response model
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    pub id: i32,
    pub member_id: i32,
    pub contribution_id: Option<i32>,
    pub schedule_id: Option<i32>,
    pub penalty_id: Option<i32>,
    #[serde(with = "rust_decimal::serde::float")]
    #[schema(value_type = f64)]
    pub paid_amount: Decimal,
    /// "contribution" or "penalty"
    pub payment_type: String,
    pub payment_date: NaiveDate,
}

impl From<payment::Model> for PaymentResponse {
    fn from(model: payment::Model) -> Self {
        Self {
            id: model.id,
            member_id: model.member_id,
            contribution_id: model.contribution_id,
            schedule_id: model.schedule_id,
            penalty_id: model.penalty_id,
            paid_amount: model.paid_amount,
            payment_type: match model.payment_type {
                PaymentType::Contribution => "contribution",
                PaymentType::Penalty => "penalty",
            }
            .to_string(),
            payment_date: model.payment_date,
        }
    }
}

/// Record a payment against a schedule month or a penalty
#[utoipa::path(
    post,
    path = "/api/v1/payments",
    tag = "payments",
    request_body = RecordPaymentRequest,
    responses(
        (status = 201, description = "Payment recorded successfully", body = ApiResponse<PaymentResponse>),
        (status = 400, description = "Invalid payment", body = ErrorResponse),
        (status = 404, description = "Schedule or penalty not found", body = ErrorResponse),
        (status = 500, description = "Payment rolled back", body = ErrorResponse)
    )
)]
#[instrument]
pub async fn record_payment(
    State(state): State<AppState>,
    Json(request): Json<RecordPaymentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PaymentResponse>>), ApiError> {
    trace!("Entering record_payment function");
    debug!("Recording payment: {:?}", request);

    let new_payment = NewPayment {
        schedule_id: request.schedule_id,
        penalty_id: request.penalty_id,
        amount: request.amount,
        payment_date: request.payment_date,
    };
    let payment = compute::payments::record_payment(&state.db, new_payment)
        .await
        .map_err(compute_error_response)?;
    state.invalidate_reports();

    info!("Payment {} recorded for member {}", payment.id, payment.member_id);
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: PaymentResponse::from(payment),
            message: "Payment recorded successfully".to_string(),
            success: true,
        }),
    ))
}
