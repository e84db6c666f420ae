use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::error::SessionError;

#[cfg(test)]
pub mod testing;

/// Capability levels a note grants to a user. The author holds every
/// level; a public note grants `Read` to anyone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionLevel {
    Read,
    Write,
    Admin,
}

impl PermissionLevel {
    fn rank(self) -> u8 {
        match self {
            PermissionLevel::Read => 0,
            PermissionLevel::Write => 1,
            PermissionLevel::Admin => 2,
        }
    }

    /// Whether a grant of this level satisfies the required level.
    pub fn allows(self, required: PermissionLevel) -> bool {
        self.rank() >= required.rank()
    }
}

/// One collaborator grant on a note.
#[derive(Debug, Clone)]
pub struct Collaborator {
    pub user_id: String,
    pub permission: PermissionLevel,
}

/// Read-only view of a note as the document store last persisted it.
/// The store remains the sole owner of content and version; the session
/// layer only inspects snapshots and asks the store to persist.
#[derive(Debug, Clone)]
pub struct NoteSnapshot {
    pub id: String,
    pub title: String,
    pub content: String,
    pub version: i64,
    pub author_id: String,
    pub is_public: bool,
    pub collaborators: Vec<Collaborator>,
    pub last_activity: DateTime<Utc>,
}

impl NoteSnapshot {
    /// Evaluate whether a user holds the required permission level on
    /// this note.
    pub fn has_permission(&self, user_id: &str, required: PermissionLevel) -> bool {
        // The author has every permission
        if self.author_id == user_id {
            return true;
        }

        match self.collaborators.iter().find(|c| c.user_id == user_id) {
            Some(collaborator) => collaborator.permission.allows(required),
            None => self.is_public && required == PermissionLevel::Read,
        }
    }
}

/// Fields to persist on an explicit save. `None` leaves the stored value
/// untouched.
#[derive(Debug, Clone, Default)]
pub struct NotePatch {
    pub content: Option<String>,
    pub title: Option<String>,
}

impl NotePatch {
    pub fn is_empty(&self) -> bool {
        self.content.is_none() && self.title.is_none()
    }
}

/// A verified user identity attached to a connection.
#[derive(Debug, Clone, PartialEq)]
pub struct Identity {
    pub id: String,
    pub nom: String,
    pub avatar: Option<String>,
}

/// A user record as the directory knows it.
#[derive(Debug, Clone)]
pub struct UserRecord {
    pub id: String,
    pub nom: String,
    pub avatar: Option<String>,
    pub is_active: bool,
}

/// Failure talking to an external collaborator.
#[derive(Debug)]
pub enum StoreError {
    Unavailable(String),
    Query(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Unavailable(msg) => write!(f, "Store unavailable: {}", msg),
            StoreError::Query(msg) => write!(f, "Store query failed: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// The document store collaborator. Owns note content, permissions and
/// the version counter; this service never holds authoritative state.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch the current snapshot of a note, or `None` if it does not exist.
    async fn get_by_id(&self, note_id: &str) -> Result<Option<NoteSnapshot>, StoreError>;

    /// Persist an explicit save and return the new authoritative version.
    /// The store increments the version itself when content or title change.
    async fn persist(&self, note_id: &str, patch: NotePatch) -> Result<i64, StoreError>;

    /// Stamp the note's last-activity time without persisting content.
    async fn touch_activity(&self, note_id: &str) -> Result<(), StoreError>;
}

/// User lookup behind the identity verifier.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError>;
}

/// The identity verifier collaborator: turns a bearer credential into a
/// user identity, or fails the connection attempt.
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    async fn verify(&self, credential: &str) -> Result<Identity, SessionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_with(collaborators: Vec<Collaborator>, is_public: bool) -> NoteSnapshot {
        NoteSnapshot {
            id: "n1".to_string(),
            title: "Title".to_string(),
            content: "Content".to_string(),
            version: 1,
            author_id: "author".to_string(),
            is_public,
            collaborators,
            last_activity: Utc::now(),
        }
    }

    #[test]
    fn author_holds_every_level() {
        let note = snapshot_with(Vec::new(), false);
        assert!(note.has_permission("author", PermissionLevel::Read));
        assert!(note.has_permission("author", PermissionLevel::Write));
        assert!(note.has_permission("author", PermissionLevel::Admin));
    }

    #[test]
    fn collaborator_grant_is_ordered() {
        let note = snapshot_with(
            vec![Collaborator {
                user_id: "u2".to_string(),
                permission: PermissionLevel::Write,
            }],
            false,
        );
        assert!(note.has_permission("u2", PermissionLevel::Read));
        assert!(note.has_permission("u2", PermissionLevel::Write));
        assert!(!note.has_permission("u2", PermissionLevel::Admin));
    }

    #[test]
    fn public_note_grants_read_only() {
        let note = snapshot_with(Vec::new(), true);
        assert!(note.has_permission("stranger", PermissionLevel::Read));
        assert!(!note.has_permission("stranger", PermissionLevel::Write));
    }

    #[test]
    fn private_note_denies_strangers() {
        let note = snapshot_with(Vec::new(), false);
        assert!(!note.has_permission("stranger", PermissionLevel::Read));
    }
}
