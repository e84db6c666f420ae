use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{error, info};

use crate::auth::auth::validate_jwt;
use crate::models::error::SessionError;
use crate::store::{Identity, IdentityVerifier, UserDirectory};

/// Verified identities are cached for a short while so rapid reconnects
/// do not hammer the user directory.
const IDENTITY_CACHE_CAPACITY: u64 = 100_000;
const IDENTITY_CACHE_TTI_SECS: u64 = 5 * 60;

/// Identity verifier backed by an HS256 JWT and the user directory.
/// The credential's `sub` claim names the user; the directory supplies
/// the display profile and the active flag.
pub struct JwtIdentityVerifier {
    secret: String,
    users: Arc<dyn UserDirectory>,
    cache: Cache<String, Identity>,
}

impl JwtIdentityVerifier {
    pub fn new(secret: String, users: Arc<dyn UserDirectory>) -> Self {
        let cache = Cache::builder()
            .max_capacity(IDENTITY_CACHE_CAPACITY)
            .time_to_idle(Duration::from_secs(IDENTITY_CACHE_TTI_SECS))
            .build();
        Self {
            secret,
            users,
            cache,
        }
    }
}

#[async_trait]
impl IdentityVerifier for JwtIdentityVerifier {
    async fn verify(&self, credential: &str) -> Result<Identity, SessionError> {
        // Validate the credential as a JWT token
        let token_data = validate_jwt(credential, &self.secret)
            .map_err(|e| SessionError::Auth(format!("JWT validation failed: {}", e)))?;

        // When a valid token is found, get the UID
        let uid = token_data
            .claims
            .get("sub")
            .and_then(|v| v.as_str())
            .ok_or_else(|| SessionError::Auth("Can't extract a UID from the JWT token".to_string()))?;

        if let Some(identity) = self.cache.get(uid).await {
            return Ok(identity);
        }

        info!("Identity cache miss for uid {}. Loading from user directory.", uid);
        let user = self
            .users
            .get_user_by_id(uid)
            .await
            .map_err(|e| {
                error!("Failed to load user {}: {}", uid, e);
                SessionError::Internal("Authentication failed".to_string())
            })?
            .ok_or_else(|| SessionError::Auth("Invalid user".to_string()))?;

        if !user.is_active {
            return Err(SessionError::Auth("Account disabled".to_string()));
        }

        let identity = Identity {
            id: user.id,
            nom: user.nom,
            avatar: user.avatar,
        };
        self.cache.insert(uid.to_string(), identity.clone()).await;
        Ok(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::testing::InMemoryDirectory;
    use crate::store::UserRecord;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::json;

    const SECRET: &str = "test-secret";

    fn token_for(uid: &str) -> String {
        // exp far in the future; Validation checks it by default
        let claims = json!({"sub": uid, "exp": 4_102_444_800u64});
        encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn active_user(uid: &str) -> UserRecord {
        UserRecord {
            id: uid.to_string(),
            nom: "Alice".to_string(),
            avatar: Some("a.png".to_string()),
            is_active: true,
        }
    }

    #[tokio::test]
    async fn valid_token_resolves_identity() {
        let directory = Arc::new(InMemoryDirectory::with_user(active_user("u1")));
        let verifier = JwtIdentityVerifier::new(SECRET.to_string(), directory);

        let identity = verifier.verify(&token_for("u1")).await.unwrap();
        assert_eq!(identity.id, "u1");
        assert_eq!(identity.nom, "Alice");
        assert_eq!(identity.avatar.as_deref(), Some("a.png"));
    }

    #[tokio::test]
    async fn garbage_token_is_rejected() {
        let directory = Arc::new(InMemoryDirectory::default());
        let verifier = JwtIdentityVerifier::new(SECRET.to_string(), directory);

        let err = verifier.verify("not-a-jwt").await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(_)));
    }

    #[tokio::test]
    async fn unknown_user_is_rejected() {
        let directory = Arc::new(InMemoryDirectory::default());
        let verifier = JwtIdentityVerifier::new(SECRET.to_string(), directory);

        let err = verifier.verify(&token_for("ghost")).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(_)));
    }

    #[tokio::test]
    async fn inactive_user_is_rejected() {
        let mut user = active_user("u2");
        user.is_active = false;
        let directory = Arc::new(InMemoryDirectory::with_user(user));
        let verifier = JwtIdentityVerifier::new(SECRET.to_string(), directory);

        let err = verifier.verify(&token_for("u2")).await.unwrap_err();
        assert!(matches!(err, SessionError::Auth(_)));
    }

    #[tokio::test]
    async fn cache_hit_skips_the_directory() {
        let directory = Arc::new(InMemoryDirectory::with_user(active_user("u3")));
        let verifier = JwtIdentityVerifier::new(SECRET.to_string(), directory.clone());

        verifier.verify(&token_for("u3")).await.unwrap();

        // Even with the record gone, the cached identity still resolves
        directory.remove("u3");
        let identity = verifier.verify(&token_for("u3")).await.unwrap();
        assert_eq!(identity.id, "u3");
    }
}
