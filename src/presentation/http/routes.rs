//! Route Configuration
//!
//! Configures all HTTP routes and the relay upgrade endpoint.

use axum::{
    middleware,
    response::IntoResponse,
    routing::{delete, get},
    Router,
};

use super::handlers;
use crate::infrastructure::metrics;
use crate::presentation::middleware::auth_middleware;
use crate::presentation::websocket::ws_handler;
use crate::startup::AppState;

/// Create the main router
pub fn create_router(state: AppState) -> Router {
    // Relay upgrade endpoint; identity resolution failure rejects the
    // request before the upgrade happens.
    let relay = Router::new()
        .route("/ws", get(ws_handler))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .merge(relay)
        // Health check endpoints
        .route("/health", get(handlers::health::health_check))
        .route("/health/live", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Prometheus metrics endpoint
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

/// Prometheus metrics endpoint handler
async fn metrics_handler() -> impl IntoResponse {
    let metrics = metrics::gather_metrics();
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4; charset=utf-8",
        )],
        metrics,
    )
}

/// API v1 routes (all protected)
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/messages/{user_a}/{user_b}",
            get(handlers::message::get_conversation),
        )
        .route(
            "/messages/{message_id}",
            delete(handlers::message::delete_message),
        )
        .route_layer(middleware::from_fn_with_state(state, auth_middleware))
}
