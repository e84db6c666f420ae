use std::collections::HashMap;

use axum::http::{self, HeaderMap};
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};

// Get the bearer credential from request headers
pub fn get_auth_token(headers: &HeaderMap) -> Result<String, String> {
    // 1. Try to get token from Authorization header
    if let Some(auth_header) = headers.get(http::header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| "Invalid Authorization header".to_string())?;
        Ok(auth_str
            .strip_prefix("Bearer ")
            .unwrap_or(auth_str)
            .to_string())
    }
    // 2. Try to get token from cookies
    else {
        let cookie_header = headers
            .get(http::header::COOKIE)
            .ok_or_else(|| "Missing Authorization header or Cookie".to_string())?
            .to_str()
            .map_err(|_| "Invalid Cookie header".to_string())?;

        for cookie in cookie::Cookie::split_parse(cookie_header) {
            if let Ok(c) = cookie {
                if c.name() == "auth_token" {
                    return Ok(c.value().to_string());
                }
            }
        }
        Err("auth_token cookie not found".to_string())
    }
}

// Get the bearer credential from a WebSocket handshake. The browser
// client passes it as a `token` query parameter; the header and cookie
// paths remain as fallbacks for non-browser clients.
pub fn get_handshake_token(
    params: &HashMap<String, String>,
    headers: &HeaderMap,
) -> Result<String, String> {
    if let Some(token) = params.get("token") {
        if !token.is_empty() {
            return Ok(token.clone());
        }
    }
    get_auth_token(headers)
}

// Validate a JWT token and return the token data
pub fn validate_jwt(
    token: &str,
    secret: &str,
) -> Result<TokenData<serde_json::Value>, jsonwebtoken::errors::Error> {
    let validation = Validation::new(Algorithm::HS256);
    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    decode::<serde_json::Value>(token, &decoding_key, &validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn bearer_header_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer abc123"),
        );
        assert_eq!(get_auth_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn cookie_fallback() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::COOKIE,
            HeaderValue::from_static("theme=dark; auth_token=tok42"),
        );
        assert_eq!(get_auth_token(&headers).unwrap(), "tok42");
    }

    #[test]
    fn handshake_query_param_wins() {
        let mut headers = HeaderMap::new();
        headers.insert(
            http::header::AUTHORIZATION,
            HeaderValue::from_static("Bearer from-header"),
        );
        let mut params = HashMap::new();
        params.insert("token".to_string(), "from-query".to_string());
        assert_eq!(
            get_handshake_token(&params, &headers).unwrap(),
            "from-query"
        );
    }

    #[test]
    fn missing_credential_is_an_error() {
        let headers = HeaderMap::new();
        assert!(get_handshake_token(&HashMap::new(), &headers).is_err());
    }
}
