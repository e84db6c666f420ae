//! In-memory collaborator doubles for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use super::{
    Collaborator, DocumentStore, Identity, IdentityVerifier, NotePatch, NoteSnapshot,
    PermissionLevel, StoreError, UserDirectory, UserRecord,
};
use crate::models::error::SessionError;

/// Build a note snapshot owned by `author_id`.
pub fn note(id: &str, content: &str, version: i64, author_id: &str) -> NoteSnapshot {
    NoteSnapshot {
        id: id.to_string(),
        title: "Untitled".to_string(),
        content: content.to_string(),
        version,
        author_id: author_id.to_string(),
        is_public: false,
        collaborators: Vec::new(),
        last_activity: Utc::now(),
    }
}

/// Add a collaborator grant to a snapshot.
pub fn with_collaborator(
    mut snapshot: NoteSnapshot,
    user_id: &str,
    permission: PermissionLevel,
) -> NoteSnapshot {
    snapshot.collaborators.push(Collaborator {
        user_id: user_id.to_string(),
        permission,
    });
    snapshot
}

/// Document store double backed by a map of snapshots.
#[derive(Default)]
pub struct InMemoryNotes {
    notes: Mutex<HashMap<String, NoteSnapshot>>,
    pub touched: AtomicUsize,
}

impl InMemoryNotes {
    pub fn with_note(snapshot: NoteSnapshot) -> Self {
        let store = Self::default();
        store.insert(snapshot);
        store
    }

    pub fn insert(&self, snapshot: NoteSnapshot) {
        self.notes
            .lock()
            .unwrap()
            .insert(snapshot.id.clone(), snapshot);
    }

    pub fn touch_count(&self) -> usize {
        self.touched.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DocumentStore for InMemoryNotes {
    async fn get_by_id(&self, note_id: &str) -> Result<Option<NoteSnapshot>, StoreError> {
        Ok(self.notes.lock().unwrap().get(note_id).cloned())
    }

    async fn persist(&self, note_id: &str, patch: NotePatch) -> Result<i64, StoreError> {
        let mut notes = self.notes.lock().unwrap();
        let snapshot = notes
            .get_mut(note_id)
            .ok_or_else(|| StoreError::Query(format!("note {} not found", note_id)))?;

        if patch.is_empty() {
            return Ok(snapshot.version);
        }
        if let Some(content) = patch.content {
            snapshot.content = content;
        }
        if let Some(title) = patch.title {
            snapshot.title = title;
        }
        snapshot.version += 1;
        snapshot.last_activity = Utc::now();
        Ok(snapshot.version)
    }

    async fn touch_activity(&self, note_id: &str) -> Result<(), StoreError> {
        let mut notes = self.notes.lock().unwrap();
        if let Some(snapshot) = notes.get_mut(note_id) {
            snapshot.last_activity = Utc::now();
        }
        self.touched.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// User directory double.
#[derive(Default)]
pub struct InMemoryDirectory {
    users: Mutex<HashMap<String, UserRecord>>,
}

impl InMemoryDirectory {
    pub fn with_user(user: UserRecord) -> Self {
        let directory = Self::default();
        directory.insert(user);
        directory
    }

    pub fn insert(&self, user: UserRecord) {
        self.users.lock().unwrap().insert(user.id.clone(), user);
    }

    pub fn remove(&self, user_id: &str) {
        self.users.lock().unwrap().remove(user_id);
    }
}

#[async_trait]
impl UserDirectory for InMemoryDirectory {
    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.lock().unwrap().get(user_id).cloned())
    }
}

/// Identity verifier double mapping fixed credentials to identities.
#[derive(Default)]
pub struct StaticVerifier {
    identities: Mutex<HashMap<String, Identity>>,
}

impl StaticVerifier {
    pub fn with_identity(credential: &str, identity: Identity) -> Self {
        let verifier = Self::default();
        verifier
            .identities
            .lock()
            .unwrap()
            .insert(credential.to_string(), identity);
        verifier
    }
}

#[async_trait]
impl IdentityVerifier for StaticVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, SessionError> {
        self.identities
            .lock()
            .unwrap()
            .get(credential)
            .cloned()
            .ok_or_else(|| SessionError::Auth("Authentication failed".to_string()))
    }
}
