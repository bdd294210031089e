//! API Routes
//!
//! Configures the Axum router with all snapshot service endpoints.

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use super::handlers::{
    get_settings_handler, health_handler, put_settings_handler, refresh_handler,
    snapshot_handler, stats_handler, AppState,
};

/// Creates the main router with all endpoints configured.
///
/// # Endpoints
/// - `GET /snapshot` - Last-known keyspace snapshot
/// - `POST /refresh` - Take a snapshot now
/// - `GET /settings` - Current poll settings
/// - `PUT /settings` - Change auto-refresh and interval
/// - `GET /stats` - Poll statistics
/// - `GET /health` - Health check endpoint
///
/// # Middleware
/// - CORS: Allows any origin so a browser dashboard can poll the service
/// - Tracing: Logs all requests for debugging
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/snapshot", get(snapshot_handler))
        .route("/refresh", post(refresh_handler))
        .route(
            "/settings",
            get(get_settings_handler).put(put_settings_handler),
        )
        .route("/stats", get(stats_handler))
        .route("/health", get(health_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
