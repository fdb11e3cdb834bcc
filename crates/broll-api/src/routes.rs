//! API routes.

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use crate::handlers::health;
use crate::handlers::jobs::{create_reel, get_job, get_task, process_video};
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 64 * 1024;

/// Create the API router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/reels", post(create_reel))
        .route("/process", post(process_video))
        .route("/jobs/:id", get(get_job))
        .route("/tasks/:task_id", get(get_task));

    Router::new()
        .route("/health", get(health))
        .nest("/api", api_routes)
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
