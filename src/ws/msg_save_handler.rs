use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::models::messages::{NoteSavedMessage, SaveNoteMessage, ServerMessage};
use crate::store::NotePatch;
use crate::AppState;

use super::connctx::ConnCtx;

/// Handle SaveNoteMessage
pub async fn handle_save_note(state: &Arc<AppState>, ctx: &mut ConnCtx, msg: &SaveNoteMessage) {
    if msg.note_id.is_empty() {
        state
            .broadcaster
            .to_conn(ctx.conn_id, ServerMessage::error("Missing note ID"))
            .await;
        return;
    }

    let patch = NotePatch {
        content: msg.content.clone(),
        title: msg.title.clone(),
    };

    match state
        .guard
        .persist_save(&msg.note_id, &ctx.identity.id, patch)
        .await
    {
        Ok(version) => {
            info!(
                "Note {} saved at version {} by user {}",
                msg.note_id, version, ctx.identity.id
            );
            // The whole room hears about a save, the saver included
            let saved = ServerMessage::NoteSaved(NoteSavedMessage {
                note_id: msg.note_id.clone(),
                version,
                saved_by: ctx.user_ref(),
                timestamp: Utc::now(),
            });
            state.broadcaster.to_room(&msg.note_id, saved).await;
        }
        Err(e) => {
            warn!(
                "save-note rejected for note {} from user {}: {}",
                msg.note_id, ctx.identity.id, e
            );
            state
                .broadcaster
                .to_conn(ctx.conn_id, ServerMessage::from(e))
                .await;
        }
    }
}
