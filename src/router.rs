use crate::handlers::{
    contributions::update_contribution,
    health::health_check,
    members::transfer_principal,
    metrics::get_metric,
    payments::record_payment,
    penalties::waive_penalty,
    reports::{get_monthly_report, get_penalty_report},
    schedules::refresh_schedules,
};
use crate::schemas::{ApiDoc, AppState};
use axum::{
    routing::{get, post, put},
    Router,
};
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Create application router with all routes and middleware
pub fn create_router(state: AppState) -> Router {
    build_router(state, timed_routes(), REQUEST_TIMEOUT)
}

/// Routes that answer within the request timeout
fn timed_routes() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Contribution edits
        .route("/api/v1/contributions/:contribution_id", put(update_contribution))
        // Reports and metric cards
        .route("/api/v1/reports/monthly", get(get_monthly_report))
        .route("/api/v1/reports/penalties/monthly", get(get_penalty_report))
        .route("/api/v1/metrics", get(get_metric))
        // Payments and waivers
        .route("/api/v1/payments", post(record_payment))
        .route("/api/v1/penalties/:penalty_id/waive", post(waive_penalty))
        // Households
        .route(
            "/api/v1/members/:member_id/transfer-principal",
            post(transfer_principal),
        )
}

fn build_router(state: AppState, timed: Router<AppState>, request_timeout: Duration) -> Router {
    // Refresh runs every batch to completion, so it stays outside the request timeout
    let long_running = Router::new()
        .route("/api/v1/schedules/refresh", post(refresh_schedules));

    timed
        .layer(TimeoutLayer::new(request_timeout))
        // Schedule generation
        .merge(long_running)
        // Swagger UI
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        // Add middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CompressionLayer::new())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}
