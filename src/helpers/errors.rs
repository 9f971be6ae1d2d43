use axum::{http::StatusCode, response::Json};
use compute::error::ComputeError;
use tracing::{error, warn};

use crate::schemas::ErrorResponse;

/// Error half of every handler result
pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
            success: false,
        }),
    )
}

/// Map an engine error to its HTTP status and error code
pub fn compute_error_response(err: ComputeError) -> ApiError {
    match err {
        ComputeError::Validation(message) => {
            warn!("Rejected request: {}", message);
            error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
        }
        ComputeError::Recurrence(reason) => {
            warn!("Rejected request: {}", reason);
            error_response(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", reason.to_string())
        }
        ComputeError::NotFound(message) => {
            warn!("Not found: {}", message);
            error_response(StatusCode::NOT_FOUND, "NOT_FOUND", message)
        }
        ComputeError::Transaction(message) => {
            error!("Transaction failed: {}", message);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, "TRANSACTION_FAILURE", message)
        }
        ComputeError::Database(db_err) => {
            error!("Database error: {}", db_err);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                db_err.to_string(),
            )
        }
    }
}
