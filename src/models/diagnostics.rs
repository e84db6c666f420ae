use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Runtime counters and host stats for the diagnostics endpoint
#[derive(Serialize, Deserialize, ToSchema)]
pub struct DiagnosticsResponse {
    /// Open WebSocket connections
    pub n_conn: u32,
    /// Rooms currently registered (including empty ones awaiting the janitor)
    pub n_rooms: u32,
    /// Presence entries across all rooms
    pub n_room_members: u32,
    pub cpu_usage: f32,
    pub memory_alloc: u64,
    pub memory_total: u64,
    pub memory_free: u64,
}
