use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use tracing::debug;

use crate::models::PresenceResponse;
use crate::AppState;

/// Presence snapshot of a note room
#[utoipa::path(
    get,
    path = "/api/v1/notes/{note_id}/presence",
    params(
        ("note_id" = String, Path, description = "Note identifier")
    ),
    responses(
        (status = 200, description = "Users currently connected to the note", body = PresenceResponse),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn note_presence(
    Path(note_id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Json<PresenceResponse> {
    debug!("Presence requested for note {}", note_id);
    let connected_users = state.registry.presence_of(&note_id).await;
    Json(PresenceResponse {
        note_id,
        connected_users,
    })
}
