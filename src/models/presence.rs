use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::messages::UserSummary;

/// Presence snapshot of one note room
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PresenceResponse {
    pub note_id: String,
    pub connected_users: Vec<UserSummary>,
}
