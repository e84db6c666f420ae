use std::sync::Arc;

use tracing::debug;

use crate::models::messages::{CursorMovedMessage, CursorPositionMessage, ServerMessage};
use crate::AppState;

use super::connctx::ConnCtx;

/// Handle CursorPositionMessage
pub async fn handle_cursor_position(
    state: &Arc<AppState>,
    ctx: &mut ConnCtx,
    msg: &CursorPositionMessage,
) {
    // Drop stale messages from a connection that has since switched rooms
    if msg.note_id.is_empty() || ctx.note_id.as_deref() != Some(msg.note_id.as_str()) {
        debug!(
            "Dropping cursor-position for note {} from connection {} (current room {:?})",
            msg.note_id, ctx.conn_id, ctx.note_id
        );
        return;
    }

    let moved = ServerMessage::CursorMoved(CursorMovedMessage {
        position: msg.position.clone(),
        selection: msg.selection.clone(),
        user: ctx.user_summary(),
    });
    state
        .broadcaster
        .to_others(&msg.note_id, ctx.conn_id, moved)
        .await;
}
