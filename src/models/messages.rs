use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::models::error::SessionError;

/// User summary carried in presence lists and join/leave notifications.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, ToSchema)]
pub struct UserSummary {
    pub id: String,
    pub nom: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

/// Short user reference stamped on edits and saves.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserRef {
    pub id: String,
    pub nom: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct JoinNoteMessage {
    pub note_id: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangeMessage {
    pub note_id: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Value>,
    /// Client's last known version; absent means no conflict check.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CursorPositionMessage {
    pub note_id: String,
    pub position: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Value>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SaveNoteMessage {
    pub note_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
}

/// Messages a client may send over an authenticated connection.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ClientMessage {
    #[serde(rename = "join-note")]
    JoinNote(JoinNoteMessage),
    #[serde(rename = "content-change")]
    ContentChange(ContentChangeMessage),
    #[serde(rename = "cursor-position")]
    CursorPosition(CursorPositionMessage),
    #[serde(rename = "save-note")]
    SaveNote(SaveNoteMessage),
    #[serde(rename = "leave-note")]
    LeaveNote,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteJoinedMessage {
    pub note_id: String,
    pub connected_users: Vec<UserSummary>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserJoinedMessage {
    pub user: UserSummary,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ContentChangedMessage {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Value>,
    /// Authoritative version at the time of the relay.
    pub version: i64,
    pub changed_by: UserRef,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VersionConflictMessage {
    pub server_version: i64,
    pub server_content: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CursorMovedMessage {
    pub position: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<Value>,
    pub user: UserSummary,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoteSavedMessage {
    pub note_id: String,
    pub version: i64,
    pub saved_by: UserRef,
    pub timestamp: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserLeftMessage {
    pub user: UserSummary,
}

/// Out-of-band delivery on the private per-user channel.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NotificationMessage {
    pub payload: Value,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorMessage {
    pub message: String,
}

/// Messages the server may push to a client.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "type")]
pub enum ServerMessage {
    #[serde(rename = "note-joined")]
    NoteJoined(NoteJoinedMessage),
    #[serde(rename = "user-joined")]
    UserJoined(UserJoinedMessage),
    #[serde(rename = "content-changed")]
    ContentChanged(ContentChangedMessage),
    #[serde(rename = "version-conflict")]
    VersionConflict(VersionConflictMessage),
    #[serde(rename = "cursor-moved")]
    CursorMoved(CursorMovedMessage),
    #[serde(rename = "note-saved")]
    NoteSaved(NoteSavedMessage),
    #[serde(rename = "user-left")]
    UserLeft(UserLeftMessage),
    #[serde(rename = "notification")]
    Notification(NotificationMessage),
    #[serde(rename = "error")]
    Error(ErrorMessage),
}

impl ServerMessage {
    pub fn error(message: impl Into<String>) -> Self {
        ServerMessage::Error(ErrorMessage {
            message: message.into(),
        })
    }
}

impl From<SessionError> for ServerMessage {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::VersionConflict {
                server_version,
                server_content,
            } => ServerMessage::VersionConflict(VersionConflictMessage {
                server_version,
                server_content,
            }),
            other => ServerMessage::error(other.to_string()),
        }
    }
}
