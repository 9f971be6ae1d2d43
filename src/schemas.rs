use common::{
    BatchFailure, MaterializeReport, MetricCard, MonthlySummary, PenaltyMonthlySummary,
    SkippedContribution,
};
use moka::future::Cache;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::config::AppSettings;
use crate::handlers::contributions::{ContributionResponse, UpdateContributionRequest};
use crate::handlers::members::PrincipalTransferResponse;
use crate::handlers::metrics::MetricQuery;
use crate::handlers::payments::{PaymentResponse, RecordPaymentRequest};
use crate::handlers::penalties::PenaltyResponse;
use crate::handlers::reports::{MonthlyReportQuery, PenaltyReportQuery};
use crate::handlers::schedules::RefreshQuery;

pub use common::ApiResponse;

/// Application state shared across handlers
#[derive(Clone, Debug)]
pub struct AppState {
    /// Database connection
    pub db: DatabaseConnection,
    /// Cache for report queries, cleared on every write
    pub cache: Cache<String, CachedReport>,
    /// Engine settings loaded at startup
    pub settings: AppSettings,
}

impl AppState {
    /// Drops every cached report after a write.
    pub fn invalidate_reports(&self) {
        self.cache.invalidate_all();
    }
}

/// Cached data types
#[derive(Clone, Debug)]
pub enum CachedReport {
    Monthly(Vec<MonthlySummary>),
    Penalties(Vec<PenaltyMonthlySummary>),
    Metric(MetricCard),
}

/// Error response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
    /// Error code
    pub code: String,
    /// Success status (always false for errors)
    pub success: bool,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    pub status: String,
    /// Service version
    pub version: String,
    /// Database connection status
    pub database: String,
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::health_check,
        crate::handlers::schedules::refresh_schedules,
        crate::handlers::contributions::update_contribution,
        crate::handlers::reports::get_monthly_report,
        crate::handlers::reports::get_penalty_report,
        crate::handlers::metrics::get_metric,
        crate::handlers::payments::record_payment,
        crate::handlers::penalties::waive_penalty,
        crate::handlers::members::transfer_principal,
    ),
    components(
        schemas(
            ApiResponse<MaterializeReport>,
            ApiResponse<ContributionResponse>,
            ApiResponse<Vec<MonthlySummary>>,
            ApiResponse<Vec<PenaltyMonthlySummary>>,
            ApiResponse<MetricCard>,
            ApiResponse<PaymentResponse>,
            ApiResponse<PenaltyResponse>,
            ApiResponse<PrincipalTransferResponse>,
            ErrorResponse,
            HealthResponse,
            MaterializeReport,
            SkippedContribution,
            BatchFailure,
            MonthlySummary,
            PenaltyMonthlySummary,
            MetricCard,
            UpdateContributionRequest,
            ContributionResponse,
            RecordPaymentRequest,
            PaymentResponse,
            PenaltyResponse,
            PrincipalTransferResponse,
            RefreshQuery,
            MonthlyReportQuery,
            PenaltyReportQuery,
            MetricQuery,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "schedules", description = "Schedule generation"),
        (name = "contributions", description = "Contribution edits and re-synchronization"),
        (name = "reports", description = "Monthly rollups"),
        (name = "metrics", description = "Dashboard metric cards"),
        (name = "payments", description = "Payments and penalty waivers"),
        (name = "members", description = "Household management"),
    ),
    info(
        title = "Edir API",
        description = "Membership and contribution ledger for community mutual-aid associations",
        version = "0.1.0",
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    )
)]
pub struct ApiDoc;
