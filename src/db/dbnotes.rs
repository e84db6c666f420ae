use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::{Error as SqlxError, Row};
use std::time::Duration;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::store::{
    Collaborator, DocumentStore, NotePatch, NoteSnapshot, PermissionLevel, StoreError,
    UserDirectory, UserRecord,
};

/// Collaborator grant as aggregated by the note query
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CollaboratorRow {
    user_id: Uuid,
    permission: String,
}

impl CollaboratorRow {
    fn permission_level(&self) -> PermissionLevel {
        match self.permission.as_str() {
            "admin" => PermissionLevel::Admin,
            "write" => PermissionLevel::Write,
            "read" => PermissionLevel::Read,
            other => {
                warn!("Unknown permission level '{}', treating as read", other);
                PermissionLevel::Read
            }
        }
    }
}

/// Database connection pool for the notes store
pub struct DbNotes {
    pool: PgPool,
}

impl DbNotes {
    /// Create a new database connection pool
    ///
    /// # Arguments
    /// * `database_url` - PostgreSQL connection string
    pub async fn new(database_url: &str) -> Result<Self, SqlxError> {
        info!("Connecting to database...");

        let pool = PgPoolOptions::new()
            .max_connections(20)
            .min_connections(2)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600)) // Close idle connections after 10 minutes
            .max_lifetime(Duration::from_secs(1800)) // Recycle connections after 30 minutes
            .connect(database_url)
            .await?;

        info!("Database connection pool created successfully");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn _pool(&self) -> &PgPool {
        &self.pool
    }

    async fn fetch_note(&self, note_id: Uuid) -> Result<Option<NoteSnapshot>, SqlxError> {
        debug!("Loading note {}", note_id);

        let query_sql = r#"
            SELECT
                n.id,
                n.title,
                n.content,
                n.version,
                n.author,
                n.is_public,
                n.last_activity,
                COALESCE(
                    (SELECT json_agg(
                        json_build_object(
                            'userId', nc.user_id,
                            'permission', nc.permission
                        )
                    ) FROM note_collaborators nc WHERE nc.note_id = n.id),
                    '[]'
                ) AS collaborators
            FROM notes n
            WHERE n.id = $1 AND n.deleted = FALSE
        "#;

        let row = sqlx::query(query_sql)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let collaborator_rows: Vec<CollaboratorRow> =
                    serde_json::from_value(row.try_get("collaborators")?)
                        .map_err(|e| SqlxError::Decode(Box::new(e)))?;
                let collaborators = collaborator_rows
                    .iter()
                    .map(|c| Collaborator {
                        user_id: c.user_id.to_string(),
                        permission: c.permission_level(),
                    })
                    .collect();

                let id: Uuid = row.try_get("id")?;
                let author: Uuid = row.try_get("author")?;
                let last_activity: DateTime<Utc> = row.try_get("last_activity")?;

                Ok(Some(NoteSnapshot {
                    id: id.to_string(),
                    title: row.try_get("title")?,
                    content: row.try_get("content")?,
                    version: row.try_get("version")?,
                    author_id: author.to_string(),
                    is_public: row.try_get("is_public")?,
                    collaborators,
                    last_activity,
                }))
            }
            None => Ok(None),
        }
    }

    async fn persist_note(&self, note_id: Uuid, patch: NotePatch) -> Result<i64, SqlxError> {
        // A save with nothing to write does not move the version
        if patch.is_empty() {
            let row = sqlx::query("SELECT version FROM notes WHERE id = $1 AND deleted = FALSE")
                .bind(note_id)
                .fetch_optional(&self.pool)
                .await?;
            return match row {
                Some(row) => row.try_get("version"),
                None => Err(SqlxError::RowNotFound),
            };
        }

        let query_sql = r#"
            UPDATE notes
            SET content = COALESCE($1, content),
                title = COALESCE($2, title),
                version = version + 1,
                last_activity = NOW(),
                updated_at = NOW()
            WHERE id = $3 AND deleted = FALSE
            RETURNING version;
        "#;
        let row = sqlx::query(query_sql)
            .bind(patch.content)
            .bind(patch.title)
            .bind(note_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let version: i64 = row.try_get("version")?;
                info!("Note {} persisted at version {}", note_id, version);
                Ok(version)
            }
            None => Err(SqlxError::RowNotFound),
        }
    }

    async fn touch_note(&self, note_id: Uuid) -> Result<(), SqlxError> {
        sqlx::query("UPDATE notes SET last_activity = NOW() WHERE id = $1 AND deleted = FALSE")
            .bind(note_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn fetch_user(&self, user_id: Uuid) -> Result<Option<UserRecord>, SqlxError> {
        let row = sqlx::query("SELECT id, nom, avatar, is_active FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let id: Uuid = row.try_get("id")?;
                Ok(Some(UserRecord {
                    id: id.to_string(),
                    nom: row.try_get("nom")?,
                    avatar: row.try_get("avatar")?,
                    is_active: row.try_get("is_active")?,
                }))
            }
            None => Ok(None),
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(id).map_err(|e| StoreError::Query(format!("Invalid id '{}': {}", id, e)))
}

fn map_err(e: SqlxError) -> StoreError {
    match e {
        SqlxError::PoolTimedOut | SqlxError::PoolClosed => StoreError::Unavailable(e.to_string()),
        other => StoreError::Query(other.to_string()),
    }
}

#[async_trait]
impl DocumentStore for DbNotes {
    async fn get_by_id(&self, note_id: &str) -> Result<Option<NoteSnapshot>, StoreError> {
        let id = parse_id(note_id)?;
        self.fetch_note(id).await.map_err(map_err)
    }

    async fn persist(&self, note_id: &str, patch: NotePatch) -> Result<i64, StoreError> {
        let id = parse_id(note_id)?;
        self.persist_note(id, patch).await.map_err(map_err)
    }

    async fn touch_activity(&self, note_id: &str) -> Result<(), StoreError> {
        let id = parse_id(note_id)?;
        self.touch_note(id).await.map_err(map_err)
    }
}

#[async_trait]
impl UserDirectory for DbNotes {
    async fn get_user_by_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        let id = parse_id(user_id)?;
        self.fetch_user(id).await.map_err(map_err)
    }
}
