use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::messages::UserSummary;
use crate::store::Identity;

/// Room membership record for one connection.
#[derive(Clone, Debug)]
pub struct PresenceEntry {
    pub user_id: String,
    pub nom: String,
    pub avatar: Option<String>,
    pub joined_at: DateTime<Utc>,
}

impl PresenceEntry {
    pub fn new(identity: &Identity) -> Self {
        Self {
            user_id: identity.id.clone(),
            nom: identity.nom.clone(),
            avatar: identity.avatar.clone(),
            joined_at: Utc::now(),
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.user_id.clone(),
            nom: self.nom.clone(),
            avatar: self.avatar.clone(),
        }
    }
}

#[derive(Default)]
struct Room {
    presence: HashMap<Uuid, PresenceEntry>,
}

impl Room {
    /// Presence summaries in join order.
    fn summaries(&self) -> Vec<UserSummary> {
        let mut entries: Vec<&PresenceEntry> = self.presence.values().collect();
        entries.sort_by(|a, b| a.joined_at.cmp(&b.joined_at));
        entries.iter().map(|e| e.summary()).collect()
    }
}

/// Result of a join: what the connection left behind and who is present
/// in the target room after the insert.
pub struct JoinOutcome {
    pub previous: Option<(String, PresenceEntry)>,
    pub connected_users: Vec<UserSummary>,
}

/// In-memory room and presence bookkeeping, keyed by note id. All
/// mutation is serialized behind the write lock. A room emptied by
/// `leave` stays registered until the janitor's `sweep_empty` runs;
/// that sweep is the only deletion path.
pub struct SessionRegistry {
    rooms: RwLock<HashMap<String, Room>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
        }
    }

    /// Insert a presence entry for `conn_id` into the room for `note_id`,
    /// creating the room if absent. Any membership in another room is
    /// removed first so the connection sits in exactly one room.
    pub async fn join(&self, conn_id: Uuid, note_id: &str, entry: PresenceEntry) -> JoinOutcome {
        let mut rooms = self.rooms.write().await;

        let mut previous = None;
        for (room_id, room) in rooms.iter_mut() {
            if room_id != note_id {
                if let Some(old_entry) = room.presence.remove(&conn_id) {
                    previous = Some((room_id.clone(), old_entry));
                    break;
                }
            }
        }

        let room = rooms.entry(note_id.to_string()).or_default();
        room.presence.insert(conn_id, entry);

        JoinOutcome {
            previous,
            connected_users: room.summaries(),
        }
    }

    /// Remove the connection's presence entry from whichever room holds
    /// it. Returns the room id and the removed entry, or `None` if the
    /// connection was not in any room. The room itself is kept even when
    /// this empties it.
    pub async fn leave(&self, conn_id: Uuid) -> Option<(String, PresenceEntry)> {
        let mut rooms = self.rooms.write().await;
        for (room_id, room) in rooms.iter_mut() {
            if let Some(entry) = room.presence.remove(&conn_id) {
                return Some((room_id.clone(), entry));
            }
        }
        None
    }

    /// Presence summaries for a room, in join order. Empty if the room
    /// does not exist.
    pub async fn presence_of(&self, note_id: &str) -> Vec<UserSummary> {
        let rooms = self.rooms.read().await;
        rooms
            .get(note_id)
            .map(|room| room.summaries())
            .unwrap_or_default()
    }

    /// Connection ids currently present in a room.
    pub async fn members_of(&self, note_id: &str) -> Vec<Uuid> {
        let rooms = self.rooms.read().await;
        rooms
            .get(note_id)
            .map(|room| room.presence.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Drop every room with no presence entries. Returns how many rooms
    /// were reclaimed.
    pub async fn sweep_empty(&self) -> usize {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|_, room| !room.presence.is_empty());
        before - rooms.len()
    }

    /// Registered rooms, including empty ones awaiting the janitor.
    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Presence entries across all rooms.
    pub async fn member_count(&self) -> usize {
        let rooms = self.rooms.read().await;
        rooms.values().map(|room| room.presence.len()).sum()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
