use std::sync::Arc;

use chrono::Utc;
use tracing::debug;

use crate::models::messages::{ContentChangeMessage, ContentChangedMessage, ServerMessage};
use crate::AppState;

use super::connctx::ConnCtx;

/// Handle ContentChangeMessage
pub async fn handle_content_change(
    state: &Arc<AppState>,
    ctx: &mut ConnCtx,
    msg: &ContentChangeMessage,
) {
    if msg.note_id.is_empty() {
        state
            .broadcaster
            .to_conn(ctx.conn_id, ServerMessage::error("Incomplete data"))
            .await;
        return;
    }

    // Permission re-check and version comparison before any relay
    match state
        .guard
        .check_content_change(&msg.note_id, &ctx.identity.id, msg.version)
        .await
    {
        Ok(version) => {
            let changed = ServerMessage::ContentChanged(ContentChangedMessage {
                content: msg.content.clone(),
                selection: msg.selection.clone(),
                version,
                changed_by: ctx.user_ref(),
                timestamp: Utc::now(),
            });
            state
                .broadcaster
                .to_others(&msg.note_id, ctx.conn_id, changed)
                .await;
        }
        Err(e) => {
            debug!(
                "content-change rejected for note {} from user {}: {}",
                msg.note_id, ctx.identity.id, e
            );
            state
                .broadcaster
                .to_conn(ctx.conn_id, ServerMessage::from(e))
                .await;
        }
    }
}
