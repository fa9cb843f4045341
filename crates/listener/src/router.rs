//! Axum router configuration.
//!
//! Routes: `POST /webhook`, `GET /health`. Any other method or path is a 404.
//! Middleware: request body limit, HTTP tracing.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let body_limit = DefaultBodyLimit::max(state.config.max_body_bytes);

    Router::new()
        .route(
            "/webhook",
            post(handlers::webhook).fallback(handlers::not_found),
        )
        .route("/health", get(handlers::health).fallback(handlers::not_found))
        .fallback(handlers::not_found)
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
