pub mod health;

use axum::{
    routing::{delete, get, patch, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Session lifecycle
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            delete(handlers::handle_delete_session),
        )
        // Segment store
        .route(
            "/api/v1/sessions/:id/segments",
            get(handlers::handle_get_segments),
        )
        .route(
            "/api/v1/sessions/:id/segments/:segment_id",
            patch(handlers::handle_update_segment).delete(handlers::handle_delete_segment),
        )
        .route(
            "/api/v1/sessions/:id/segments/:segment_id/move",
            post(handlers::handle_move_segment),
        )
        // Generation
        .route(
            "/api/v1/sessions/:id/segments/:segment_id/generate",
            post(handlers::handle_generate_segment),
        )
        // Sync + preview
        .route("/api/v1/sessions/:id/sync", post(handlers::handle_sync))
        .route("/api/v1/sessions/:id/preview", get(handlers::handle_preview))
        .with_state(state)
}
