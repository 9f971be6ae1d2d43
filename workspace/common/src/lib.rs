//! Common transport-layer types shared between the HTTP layer and the
//! contribution engine, plus the money helpers both sides rely on.
//! Report rows live here so the API can serialize engine output without
//! duplicating shapes.

pub mod money;
mod reports;

pub use money::{display_amount, percentage_change, round_money};
pub use reports::{
    BatchFailure, MaterializeReport, MetricCard, MonthlySummary, PenaltyMonthlySummary,
    SkippedContribution, month_label,
};

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Generic API response wrapper used by the backend.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Response data
    pub data: T,
    /// Response message
    pub message: String,
    /// Success flag
    pub success: bool,
}
