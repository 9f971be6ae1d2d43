use thiserror::Error;
use tracing::error;

use crate::recurrence::RecurrenceError;

/// Error types for the contribution engine
#[derive(Error, Debug)]
pub enum ComputeError {
    /// Error from the database operations
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// Malformed or missing input, rejected before any write
    #[error("Validation error: {0}")]
    Validation(String),

    /// A referenced record does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// A step inside an atomic unit failed and the whole unit was rolled back
    #[error("Transaction failed: {0}")]
    Transaction(String),

    /// A contribution's month window could not be computed
    #[error("Recurrence error: {0}")]
    Recurrence(#[from] RecurrenceError),
}

impl ComputeError {
    pub fn not_found(entity: &str, id: i32) -> Self {
        ComputeError::NotFound(format!("{} with id {} does not exist", entity, id))
    }

    /// Storage failures raised inside an atomic unit surface as transaction failures.
    pub fn into_transaction_failure(self) -> Self {
        match self {
            ComputeError::Database(db_err) => {
                let err = ComputeError::Transaction(db_err.to_string());
                error!(?err, "Rolled back after storage failure");
                err
            }
            other => other,
        }
    }
}

/// Type alias for Result with ComputeError
pub type Result<T> = std::result::Result<T, ComputeError>;
