use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{SinkExt, StreamExt};
use tracing::{debug, error, info, warn};

use crate::auth::auth::get_handshake_token;
use crate::models::messages::{ClientMessage, ServerMessage};
use crate::store::Identity;
use crate::AppState;

use super::connctx::ConnCtx;
use super::{
    msg_content_handler, msg_cursor_handler, msg_join_handler, msg_leave_handler, msg_save_handler,
};

/// WebSocket handler. The bearer credential is verified during the
/// handshake; an unverified socket is never upgraded and no session
/// state is created for it.
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    State(state): State<Arc<AppState>>,
) -> Response {
    let token = match get_handshake_token(&params, &headers) {
        Ok(token) => token,
        Err(e) => {
            warn!("WebSocket handshake without credential: {}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    let identity = match state.verifier.verify(&token).await {
        Ok(identity) => identity,
        Err(e) => {
            warn!("WebSocket authentication failed: {}", e);
            return StatusCode::UNAUTHORIZED.into_response();
        }
    };

    ws.on_upgrade(move |socket| handle_socket(socket, identity, state))
}

/// Handle an authenticated WebSocket connection
async fn handle_socket(socket: WebSocket, identity: Identity, state: Arc<AppState>) {
    let mut ctx = ConnCtx::new(identity);
    info!(
        "WebSocket connection established for user {} with connection_id {}",
        ctx.identity.id, ctx.conn_id
    );

    // Split the socket into sender and receiver
    let (mut sender, mut receiver) = socket.split();

    // Register the outbound queue; this also subscribes the connection
    // to the private channel for its own user id
    let mut outbound = state.broadcaster.register(ctx.conn_id, &ctx.identity.id).await;

    // Writer task drains the queue in order
    let send_task = tokio::spawn(async move {
        while let Some(msg) = outbound.recv().await {
            let text = match serde_json::to_string(&msg) {
                Ok(text) => text,
                Err(e) => {
                    error!("Failed to serialize outbound message: {}", e);
                    continue;
                }
            };
            if sender.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    // Reader loop parses and dispatches; a bad frame never ends the session
    while let Some(Ok(frame)) = receiver.next().await {
        let text = match frame {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };

        let msg: ClientMessage = match serde_json::from_str(&text) {
            Ok(msg) => msg,
            Err(e) => {
                debug!("Unparseable frame from connection {}: {}", ctx.conn_id, e);
                state
                    .broadcaster
                    .to_conn(ctx.conn_id, ServerMessage::error("Invalid message"))
                    .await;
                continue;
            }
        };

        dispatch_message(&state, &mut ctx, msg).await;
    }

    // Unconditional cleanup on socket close
    msg_leave_handler::handle_user_leave(&state, &mut ctx).await;
    state.broadcaster.unregister(ctx.conn_id, &ctx.identity.id).await;
    send_task.abort();
    info!(
        "WebSocket connection terminated for connection_id {}",
        ctx.conn_id
    );
}

/// Route one inbound message. Failures become replies to the sender
/// only; other connections are never affected.
pub(crate) async fn dispatch_message(state: &Arc<AppState>, ctx: &mut ConnCtx, msg: ClientMessage) {
    match msg {
        ClientMessage::JoinNote(m) => msg_join_handler::handle_join_note(state, ctx, &m).await,
        ClientMessage::ContentChange(m) => {
            msg_content_handler::handle_content_change(state, ctx, &m).await
        }
        ClientMessage::CursorPosition(m) => {
            msg_cursor_handler::handle_cursor_position(state, ctx, &m).await
        }
        ClientMessage::SaveNote(m) => msg_save_handler::handle_save_note(state, ctx, &m).await,
        ClientMessage::LeaveNote => msg_leave_handler::handle_leave_note(state, ctx).await,
    }
}
