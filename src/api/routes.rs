use axum::{routing::get, Router};
use tower_http::cors::{Any, CorsLayer};

use crate::api::{handlers, state::AppState};

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Operator pass triggers; responses are summary counts, never raw data
        .route("/api/ingest/run", get(handlers::run_ingestion))
        .route("/api/grade/run", get(handlers::run_grading))
        // Read paths for the rendering layer
        .route("/api/leaderboard", get(handlers::get_leaderboard))
        .route("/api/review", get(handlers::get_needs_review))
        .route("/health", get(handlers::health))
        .with_state(state)
        .layer(cors)
}
