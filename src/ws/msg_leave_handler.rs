use std::sync::Arc;

use tracing::info;

use crate::models::messages::{ServerMessage, UserLeftMessage};
use crate::AppState;

use super::connctx::ConnCtx;

/// Remove the connection's presence entry and notify the room it left.
/// Shared by the explicit leave-note message and socket close; the
/// emptied room is left for the janitor.
pub async fn handle_user_leave(state: &Arc<AppState>, ctx: &mut ConnCtx) {
    if let Some((note_id, entry)) = state.registry.leave(ctx.conn_id).await {
        state
            .broadcaster
            .to_others(
                &note_id,
                ctx.conn_id,
                ServerMessage::UserLeft(UserLeftMessage {
                    user: entry.summary(),
                }),
            )
            .await;
        info!("User {} left note {}", entry.user_id, note_id);
    }
    ctx.note_id = None;
}

/// Handle the explicit leave-note message
pub async fn handle_leave_note(state: &Arc<AppState>, ctx: &mut ConnCtx) {
    handle_user_leave(state, ctx).await;
}
