//! API Router configuration

use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Create the main router
pub fn create_router(state: AppState, enable_cors: bool) -> Router {
    let api_routes = Router::new().route("/status", get(handlers::daemon_status));

    let router = Router::new()
        // Keepalive checks
        .route("/health", get(handlers::health_check))
        .route("/healthz", get(handlers::health_check))
        // Discord interactions endpoint
        .route("/interactions", post(handlers::handle_interaction))
        .nest("/api/v1", api_routes)
        .fallback(handlers::banner)
        .layer(TraceLayer::new_for_http());

    let router = if enable_cors {
        router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
    } else {
        router
    };

    router.with_state(state)
}
