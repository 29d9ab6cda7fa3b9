//! Gateway route definitions.

use axum::{routing::post, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Create the gateway router.
///
/// CORS is wide open; the gateways carry no state and the secret lives
/// server-side. The layer also answers the browser preflight for both routes.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/functions/chat", post(handlers::chat))
        .route("/functions/format-diary", post(handlers::format_diary))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
