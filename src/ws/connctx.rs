use uuid::Uuid;

use crate::models::messages::{UserRef, UserSummary};
use crate::store::Identity;

/// Per-connection session state. Owned exclusively by the gateway task;
/// the registry only ever sees the connection id.
#[derive(Clone, Debug)]
pub struct ConnCtx {
    pub conn_id: Uuid,
    pub identity: Identity,
    /// Room the connection currently occupies, if any. A connection is
    /// in at most one room at a time.
    pub note_id: Option<String>,
}

impl ConnCtx {
    pub fn new(identity: Identity) -> Self {
        Self {
            conn_id: Uuid::new_v4(),
            identity,
            note_id: None,
        }
    }

    pub fn user_summary(&self) -> UserSummary {
        UserSummary {
            id: self.identity.id.clone(),
            nom: self.identity.nom.clone(),
            avatar: self.identity.avatar.clone(),
        }
    }

    pub fn user_ref(&self) -> UserRef {
        UserRef {
            id: self.identity.id.clone(),
            nom: self.identity.nom.clone(),
        }
    }
}
