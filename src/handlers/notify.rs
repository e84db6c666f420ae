use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Extension, Json};
use tracing::info;

use crate::models::messages::{NotificationMessage, ServerMessage};
use crate::models::{NotifyRequest, NotifyResponse};
use crate::routes::auth_middleware::AuthUser;
use crate::AppState;

/// Deliver a personal notification onto a user's private channel. The
/// sibling services that own documents and collaborators call this when
/// something happens off-room (a collaborator added, a share revoked).
#[utoipa::path(
    post,
    path = "/api/v1/notifications",
    request_body = NotifyRequest,
    responses(
        (status = 202, description = "Notification queued", body = NotifyResponse),
        (status = 401, description = "Missing or invalid credential")
    )
)]
pub async fn notify_user(
    State(state): State<Arc<AppState>>,
    Extension(AuthUser(caller)): Extension<AuthUser>,
    Json(req): Json<NotifyRequest>,
) -> (StatusCode, Json<NotifyResponse>) {
    let delivered = state
        .broadcaster
        .to_user(
            &req.user_id,
            ServerMessage::Notification(NotificationMessage {
                payload: req.payload,
            }),
        )
        .await;
    info!(
        "Notification from {} for user {} queued for {} connection(s)",
        caller, req.user_id, delivered
    );
    (StatusCode::ACCEPTED, Json(NotifyResponse { delivered }))
}
