use anyhow::Result;
use tokio::net::TcpListener;
use tracing::{debug, error, info, trace};

use crate::config::initialize_app_state_with_url;
use crate::router::create_router;
use crate::schemas::AppState;

pub async fn serve(database_url: &str, bind_address: &str) -> Result<()> {
    trace!("Entering serve function");
    info!("Edir application starting up");
    debug!("Database URL: {}", database_url);

    let state = initialize_app_state_with_url(database_url).await.map_err(|e| {
        error!("Failed to initialize application state: {}", e);
        e
    })?;
    run_server(state, bind_address).await
}

/// Bind `bind_address` and serve the API until shutdown
pub async fn run_server(state: AppState, bind_address: &str) -> Result<()> {
    debug!(
        "Schedule batch size {}, horizon {} months",
        state.settings.schedule.batch_size, state.settings.schedule.horizon_months
    );
    let app = create_router(state);

    info!("Starting server on {}", bind_address);
    let listener = match TcpListener::bind(bind_address).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to bind to address {}: {}", bind_address, e);
            return Err(e.into());
        }
    };

    info!("Edir API server running on http://{}", bind_address);
    info!("Swagger UI available at http://{}/swagger-ui", bind_address);

    if let Err(e) = axum::serve(listener, app).await {
        error!("Server error: {}", e);
        return Err(e.into());
    }

    info!("Server shutdown gracefully");
    Ok(())
}
