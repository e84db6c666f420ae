use std::sync::Arc;

use tracing::{error, info};

use crate::models::messages::{
    JoinNoteMessage, NoteJoinedMessage, ServerMessage, UserJoinedMessage, UserLeftMessage,
};
use crate::store::PermissionLevel;
use crate::AppState;

use super::connctx::ConnCtx;
use super::registry::PresenceEntry;

/// Handle JoinNoteMessage
pub async fn handle_join_note(state: &Arc<AppState>, ctx: &mut ConnCtx, msg: &JoinNoteMessage) {
    if msg.note_id.is_empty() {
        state
            .broadcaster
            .to_conn(ctx.conn_id, ServerMessage::error("Missing note ID"))
            .await;
        return;
    }

    // Read access check against the document store
    let note = match state.store.get_by_id(&msg.note_id).await {
        Ok(Some(note)) => note,
        Ok(None) => {
            state
                .broadcaster
                .to_conn(ctx.conn_id, ServerMessage::error("Insufficient permissions"))
                .await;
            return;
        }
        Err(e) => {
            error!("Failed to check access for note {}: {}", msg.note_id, e);
            state
                .broadcaster
                .to_conn(ctx.conn_id, ServerMessage::error("Failed to join note"))
                .await;
            return;
        }
    };
    if !note.has_permission(&ctx.identity.id, PermissionLevel::Read) {
        state
            .broadcaster
            .to_conn(ctx.conn_id, ServerMessage::error("Insufficient permissions"))
            .await;
        return;
    }

    // Move the presence entry; a connection sits in one room at a time
    let entry = PresenceEntry::new(&ctx.identity);
    let outcome = state.registry.join(ctx.conn_id, &msg.note_id, entry).await;
    ctx.note_id = Some(msg.note_id.clone());

    // The room we abandoned sees the departure
    if let Some((old_note_id, old_entry)) = outcome.previous {
        state
            .broadcaster
            .to_others(
                &old_note_id,
                ctx.conn_id,
                ServerMessage::UserLeft(UserLeftMessage {
                    user: old_entry.summary(),
                }),
            )
            .await;
    }

    // Tell the room about the arrival
    state
        .broadcaster
        .to_others(
            &msg.note_id,
            ctx.conn_id,
            ServerMessage::UserJoined(UserJoinedMessage {
                user: ctx.user_summary(),
            }),
        )
        .await;

    // Hand the joiner the current presence snapshot
    state
        .broadcaster
        .to_conn(
            ctx.conn_id,
            ServerMessage::NoteJoined(NoteJoinedMessage {
                note_id: msg.note_id.clone(),
                connected_users: outcome.connected_users,
            }),
        )
        .await;

    info!("User {} joined note {}", ctx.identity.id, msg.note_id);
}
