use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::registry::SessionRegistry;

/// Spawn the periodic sweep that reclaims rooms left without presence.
/// This is the only path that deletes an empty room; `leave` and
/// disconnect only empty it.
pub fn spawn(registry: Arc<SessionRegistry>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        // the first tick completes immediately
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = registry.sweep_empty().await;
            if removed > 0 {
                info!("Janitor reclaimed {} empty room(s)", removed);
            } else {
                debug!("Janitor sweep found no empty rooms");
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Identity;
    use crate::ws::registry::PresenceEntry;
    use uuid::Uuid;

    #[tokio::test]
    async fn empty_room_is_reclaimed_within_one_interval() {
        let registry = Arc::new(SessionRegistry::new());
        let conn = Uuid::new_v4();
        let identity = Identity {
            id: "u1".to_string(),
            nom: "Alice".to_string(),
            avatar: None,
        };

        registry
            .join(conn, "n1", PresenceEntry::new(&identity))
            .await;
        registry.leave(conn).await;
        assert_eq!(registry.room_count().await, 1);

        let handle = spawn(registry.clone(), Duration::from_millis(100));

        // not before the interval elapses
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(registry.room_count().await, 1);

        // within one interval of becoming empty
        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(registry.room_count().await, 0);

        handle.abort();
    }
}
