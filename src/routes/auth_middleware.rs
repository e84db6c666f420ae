use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use tracing::{debug, error};

use crate::auth::auth::{get_auth_token, validate_jwt};
use crate::config;

/// Authenticated user id attached to request extensions
#[derive(Clone, Debug)]
pub struct AuthUser(pub String);

pub async fn auth_middleware(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    // 1. Get the auth token from the request
    let token = match get_auth_token(req.headers()) {
        Ok(token) => token,
        Err(_) => return Err(StatusCode::UNAUTHORIZED),
    };

    // 2. Validate the token
    let config = config::get_config();
    let secret = match &config.jwt_secret {
        Some(secret) => secret,
        None => {
            error!("JWT secret not configured");
            return Err(StatusCode::INTERNAL_SERVER_ERROR);
        }
    };
    let token_data = match validate_jwt(&token, secret) {
        Ok(token_data) => token_data,
        Err(e) => {
            error!("JWT validation failed: {}", e);
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    // 3. Extract the UID
    let uid = match token_data.claims.get("sub").and_then(|v| v.as_str()) {
        Some(sub) => sub.to_string(),
        None => {
            error!("JWT token does not contain 'sub' claim");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };
    debug!("Request authenticated for user {}", uid);

    // 4. Make the user id available to downstream handlers
    req.extensions_mut().insert(AuthUser(uid));

    // Token is valid, proceed to next middleware/handler
    Ok(next.run(req).await)
}
