use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::server::{pages, upload, AppState};

/// Main router. The body limit is lifted because the application itself
/// enforces no upload size cap.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(pages::index))
        .route("/uploads", post(upload::upload))
        .route("/sessions/:id", get(pages::session_page))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}
