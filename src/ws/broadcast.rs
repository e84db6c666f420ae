use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::messages::ServerMessage;

use super::registry::SessionRegistry;

/// Outbound queue capacity per connection. A recipient that falls this
/// far behind starts losing messages rather than growing the queue
/// without bound.
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Fans messages out to connections sharing a room and to per-user
/// private channels. Each connection gets one bounded queue drained by
/// its writer task, which gives per-recipient FIFO delivery.
pub struct Broadcaster {
    registry: Arc<SessionRegistry>,
    senders: RwLock<HashMap<Uuid, mpsc::Sender<ServerMessage>>>,
    user_channels: RwLock<HashMap<String, Vec<Uuid>>>,
}

impl Broadcaster {
    pub fn new(registry: Arc<SessionRegistry>) -> Self {
        Self {
            registry,
            senders: RwLock::new(HashMap::new()),
            user_channels: RwLock::new(HashMap::new()),
        }
    }

    /// Register a connection's outbound queue and subscribe it to the
    /// private channel for its user id. Returns the receiving end for
    /// the connection's writer task.
    pub async fn register(&self, conn_id: Uuid, user_id: &str) -> mpsc::Receiver<ServerMessage> {
        let (tx, rx) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
        self.senders.write().await.insert(conn_id, tx);
        self.user_channels
            .write()
            .await
            .entry(user_id.to_string())
            .or_default()
            .push(conn_id);
        rx
    }

    /// Drop a connection's queue and its private-channel subscription.
    pub async fn unregister(&self, conn_id: Uuid, user_id: &str) {
        self.senders.write().await.remove(&conn_id);
        let mut channels = self.user_channels.write().await;
        if let Some(conns) = channels.get_mut(user_id) {
            conns.retain(|c| *c != conn_id);
            if conns.is_empty() {
                channels.remove(user_id);
            }
        }
    }

    /// Queue a message for a single connection.
    pub async fn to_conn(&self, conn_id: Uuid, msg: ServerMessage) {
        self.deliver(conn_id, msg).await;
    }

    /// Queue a message for every member of a room, the sender included.
    pub async fn to_room(&self, note_id: &str, msg: ServerMessage) {
        for member in self.registry.members_of(note_id).await {
            self.deliver(member, msg.clone()).await;
        }
    }

    /// Queue a message for every member of a room except the sender.
    pub async fn to_others(&self, note_id: &str, sender_conn: Uuid, msg: ServerMessage) {
        for member in self.registry.members_of(note_id).await {
            if member != sender_conn {
                self.deliver(member, msg.clone()).await;
            }
        }
    }

    /// Queue a message on a user's private channel. Returns how many
    /// connections it was queued for.
    pub async fn to_user(&self, user_id: &str, msg: ServerMessage) -> usize {
        let conns = {
            let channels = self.user_channels.read().await;
            channels.get(user_id).cloned().unwrap_or_default()
        };
        for conn_id in &conns {
            self.deliver(*conn_id, msg.clone()).await;
        }
        conns.len()
    }

    /// Open connections with a registered queue.
    pub async fn connection_count(&self) -> usize {
        self.senders.read().await.len()
    }

    async fn deliver(&self, conn_id: Uuid, msg: ServerMessage) {
        let closed = {
            let senders = self.senders.read().await;
            match senders.get(&conn_id) {
                Some(tx) => match tx.try_send(msg) {
                    Ok(()) => false,
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        warn!("Outbound queue full for connection {}, dropping message", conn_id);
                        false
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => true,
                },
                None => {
                    debug!("No outbound queue for connection {}", conn_id);
                    false
                }
            }
        };

        // Writer task is gone; forget the queue
        if closed {
            self.senders.write().await.remove(&conn_id);
        }
    }
}
