//! API route definitions.

use axum::{
    Router,
    middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::handlers::{embed, health};
use crate::middleware::{cors_layer, request_id};
use crate::state::AppState;

/// Create the main API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .nest("/api/v1", api_routes())
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .layer(middleware::from_fn(request_id))
        .with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/workspaces/{workspace_id}", workspace_routes())
}

fn workspace_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/embed", post(embed::batch_embed_params))
        .route("/reports/{report_id}/embed", get(embed::get_embed_params))
        .route("/reports/{report_id}/widget", get(embed::get_widget_config))
}
