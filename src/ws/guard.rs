use std::sync::Arc;

use tracing::{error, warn};

use crate::models::error::SessionError;
use crate::store::{DocumentStore, NotePatch, NoteSnapshot, PermissionLevel};

/// Write-path checks in front of the broadcast coordinator: permission
/// re-check against the document store and the optimistic version
/// comparison. The store stays the sole owner of the version counter.
pub struct VersionGuard {
    store: Arc<dyn DocumentStore>,
}

impl VersionGuard {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Load the note and require write permission for the user. Shared
    /// by the content-change and save paths.
    async fn writable_note(
        &self,
        note_id: &str,
        user_id: &str,
    ) -> Result<NoteSnapshot, SessionError> {
        let note = self
            .store
            .get_by_id(note_id)
            .await
            .map_err(|e| {
                error!("Document store lookup failed for note {}: {}", note_id, e);
                SessionError::Internal("Failed to load note".to_string())
            })?
            .ok_or_else(|| SessionError::NotFound("Note not found".to_string()))?;

        if !note.has_permission(user_id, PermissionLevel::Write) {
            return Err(SessionError::Permission(
                "Insufficient write permissions".to_string(),
            ));
        }
        Ok(note)
    }

    /// Gate a content-change. `Ok(version)` means the change may be
    /// relayed, stamped with the store's authoritative version. A
    /// client version older than the store's yields a conflict carrying
    /// the authoritative state; an absent client version skips the
    /// check entirely.
    pub async fn check_content_change(
        &self,
        note_id: &str,
        user_id: &str,
        client_version: Option<i64>,
    ) -> Result<i64, SessionError> {
        let note = self.writable_note(note_id, user_id).await?;

        if let Some(version) = client_version {
            if note.version > version {
                return Err(SessionError::VersionConflict {
                    server_version: note.version,
                    server_content: note.content,
                });
            }
        }

        // Content is not persisted here; only the activity stamp moves,
        // and the relay never waits on it.
        let store = self.store.clone();
        let id = note_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = store.touch_activity(&id).await {
                warn!("Failed to update activity for note {}: {}", id, e);
            }
        });

        Ok(note.version)
    }

    /// Persist an explicit save and return the new authoritative
    /// version. The store increments the counter itself.
    pub async fn persist_save(
        &self,
        note_id: &str,
        user_id: &str,
        patch: NotePatch,
    ) -> Result<i64, SessionError> {
        self.writable_note(note_id, user_id).await?;

        self.store.persist(note_id, patch).await.map_err(|e| {
            error!("Failed to persist note {}: {}", note_id, e);
            SessionError::Internal("Save failed".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::{note, with_collaborator, InMemoryNotes};
    use std::time::Duration;

    fn guard_with(store: Arc<InMemoryNotes>) -> VersionGuard {
        VersionGuard::new(store)
    }

    #[tokio::test]
    async fn stale_version_yields_conflict_with_server_state() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "server copy", 3, "u1")));
        let guard = guard_with(store);

        let err = guard
            .check_content_change("n1", "u1", Some(2))
            .await
            .unwrap_err();
        match err {
            SessionError::VersionConflict {
                server_version,
                server_content,
            } => {
                assert_eq!(server_version, 3);
                assert_eq!(server_content, "server copy");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn matching_version_passes_with_authoritative_stamp() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "u1")));
        let guard = guard_with(store);

        assert_eq!(guard.check_content_change("n1", "u1", Some(3)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn newer_client_version_passes() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "u1")));
        let guard = guard_with(store);

        // Still stamped with the store's version, not the client's
        assert_eq!(guard.check_content_change("n1", "u1", Some(5)).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn absent_version_skips_the_check() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "u1")));
        let guard = guard_with(store);

        assert_eq!(guard.check_content_change("n1", "u1", None).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn passing_change_touches_activity() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "u1")));
        let guard = guard_with(store.clone());

        guard.check_content_change("n1", "u1", Some(3)).await.unwrap();

        // touch_activity runs on a spawned task
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.touch_count(), 1);
    }

    #[tokio::test]
    async fn conflicting_change_does_not_touch_activity() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "u1")));
        let guard = guard_with(store.clone());

        let _ = guard.check_content_change("n1", "u1", Some(1)).await;

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(store.touch_count(), 0);
    }

    #[tokio::test]
    async fn read_only_collaborator_cannot_change_content() {
        let snapshot = with_collaborator(note("n1", "abc", 3, "owner"), "reader", PermissionLevel::Read);
        let store = Arc::new(InMemoryNotes::with_note(snapshot));
        let guard = guard_with(store);

        let err = guard
            .check_content_change("n1", "reader", Some(3))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Permission(_)));
    }

    #[tokio::test]
    async fn missing_note_is_not_found() {
        let store = Arc::new(InMemoryNotes::default());
        let guard = guard_with(store);

        let err = guard
            .check_content_change("ghost", "u1", Some(1))
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::NotFound(_)));
    }

    #[tokio::test]
    async fn save_returns_the_incremented_version() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "u1")));
        let guard = guard_with(store);

        let patch = NotePatch {
            content: Some("new content".to_string()),
            title: None,
        };
        assert_eq!(guard.persist_save("n1", "u1", patch).await.unwrap(), 4);

        let patch = NotePatch {
            content: None,
            title: Some("New title".to_string()),
        };
        assert_eq!(guard.persist_save("n1", "u1", patch).await.unwrap(), 5);
    }

    #[tokio::test]
    async fn empty_save_keeps_the_version() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "u1")));
        let guard = guard_with(store);

        assert_eq!(
            guard.persist_save("n1", "u1", NotePatch::default()).await.unwrap(),
            3
        );
    }

    #[tokio::test]
    async fn save_requires_write_permission() {
        let store = Arc::new(InMemoryNotes::with_note(note("n1", "abc", 3, "owner")));
        let guard = guard_with(store);

        let err = guard
            .persist_save("n1", "stranger", NotePatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::Permission(_)));
    }
}
