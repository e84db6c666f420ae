use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

use crate::handlers::{diagnostics, note_presence, notify_user};
use crate::routes::auth_middleware::auth_middleware;
use crate::AppState;

/// Create API routes
pub fn create_api_routes(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/notes/:note_id/presence", get(note_presence))
        .route("/v1/notifications", post(notify_user))
        .route("/v1/diagnostics", get(diagnostics))
        .route_layer(middleware::from_fn(auth_middleware)) // Applies to all routes added above
        .with_state(state)
}
