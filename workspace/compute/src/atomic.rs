use sea_orm::DatabaseTransaction;
use tracing::{error, warn};

use crate::error::{ComputeError, Result};

/// Commits `txn` when `result` is `Ok`, rolls it back otherwise.
///
/// Storage errors on either path come back as [`ComputeError::Transaction`];
/// validation and lookup errors are returned unchanged.
pub(crate) async fn finish<T>(txn: DatabaseTransaction, result: Result<T>, operation: &str) -> Result<T> {
    match result {
        Ok(value) => {
            txn.commit()
                .await
                .map_err(|e| ComputeError::from(e).into_transaction_failure())?;
            Ok(value)
        }
        Err(err) => {
            warn!("Rolling back {}: {}", operation, err);
            if let Err(rollback_err) = txn.rollback().await {
                error!("Rollback of {} failed: {}", operation, rollback_err);
            }
            Err(err.into_transaction_failure())
        }
    }
}
