//! Route configuration.

use axum::{
    Router,
    routing::{get, post},
};
use tower::ServiceBuilder;

use crate::api::handlers::{health_handler, redirect_handler, shorten_handler, unlock_handler};
use crate::api::middleware;
use crate::state::AppState;

/// Builds the application router.
///
/// # Endpoints
///
/// - `POST /api/shorten`     - create a shortened URL
/// - `GET  /api/health`      - component health report
/// - `GET  /{identifier}`    - redeem and redirect (optional `?password=`)
/// - `POST /{identifier}`    - redeem with the password form
pub fn app_router(state: AppState) -> Router {
    let api = Router::new()
        .route("/shorten", post(shorten_handler))
        .route("/health", get(health_handler))
        .layer(middleware::throttle::api_layer());

    let redirect = Router::new()
        .route(
            "/{identifier}",
            get(redirect_handler).post(unlock_handler),
        )
        .layer(middleware::throttle::redirect_layer());

    Router::new()
        .nest("/api", api)
        .merge(redirect)
        .layer(ServiceBuilder::new().layer(middleware::tracing::layer()))
        .with_state(state)
}
