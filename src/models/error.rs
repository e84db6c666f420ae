use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::store::StoreError;

/// Response for an error
#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub code: u16,
    pub status: String,
    pub error: String,
}

/// Failure taxonomy for the realtime session layer. Every variant is
/// scoped to one inbound message or connection attempt; none of them
/// terminates an established connection.
#[derive(Debug)]
pub enum SessionError {
    /// Bad or missing credential; the handshake is rejected.
    Auth(String),
    /// Insufficient capability for a join, edit or save.
    Permission(String),
    /// The referenced note does not exist.
    NotFound(String),
    /// Stale write; carries the authoritative state for the sender.
    VersionConflict {
        server_version: i64,
        server_content: String,
    },
    /// Unexpected failure calling a collaborator.
    Internal(String),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Auth(msg) => write!(f, "{}", msg),
            SessionError::Permission(msg) => write!(f, "{}", msg),
            SessionError::NotFound(msg) => write!(f, "{}", msg),
            SessionError::VersionConflict { server_version, .. } => {
                write!(f, "Version conflict (server version {})", server_version)
            }
            SessionError::Internal(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<StoreError> for SessionError {
    fn from(e: StoreError) -> Self {
        SessionError::Internal(e.to_string())
    }
}
