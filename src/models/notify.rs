use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Request to deliver a personal notification onto a user's private channel
#[derive(Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    pub user_id: String,
    #[schema(value_type = Object)]
    pub payload: serde_json::Value,
}

/// Delivery outcome for a notification request
#[derive(Serialize, Deserialize, ToSchema)]
pub struct NotifyResponse {
    /// Connections the notification was queued for
    pub delivered: usize,
}
