//! Request authentication helpers

use axum::http::{header::AUTHORIZATION, HeaderMap};

use crate::error::{GatewayError, GatewayResult};
use crate::state::GatewayState;

/// Extract the bearer token from an Authorization header
pub fn require_bearer(headers: &HeaderMap) -> GatewayResult<String> {
    let value = headers
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| {
            GatewayError::AuthenticationFailed("missing authorization header".to_string())
        })?;

    let mut parts = value.split_whitespace();
    let scheme = parts.next().unwrap_or("");
    if !scheme.eq_ignore_ascii_case("Bearer") {
        return Err(GatewayError::AuthenticationFailed(
            "invalid authorization scheme".to_string(),
        ));
    }

    let token = parts.next().unwrap_or("");
    if token.is_empty() {
        return Err(GatewayError::AuthenticationFailed(
            "missing bearer token".to_string(),
        ));
    }

    Ok(token.to_string())
}

/// Resolve the caller's identity from the request headers
pub async fn authenticate(state: &GatewayState, headers: &HeaderMap) -> GatewayResult<i64> {
    let token = require_bearer(headers)?;
    let user_id = state.sessions.validate(&token).await?;
    Ok(user_id)
}

/// Resolve an identity from a raw token value (WebSocket query parameter)
pub async fn authenticate_token(
    state: &GatewayState,
    token: Option<String>,
) -> GatewayResult<i64> {
    let token = token.ok_or_else(|| {
        GatewayError::AuthenticationFailed("missing token".to_string())
    })?;
    let user_id = state.sessions.validate(&token).await?;
    Ok(user_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn require_bearer_extracts_token_case_insensitive() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("bearer TOKEN123"));

        let token = require_bearer(&headers).expect("token should be extracted");
        assert_eq!(token, "TOKEN123");
    }

    #[test]
    fn require_bearer_rejects_missing_header() {
        let headers = HeaderMap::new();
        let error = require_bearer(&headers).expect_err("should reject missing header");
        assert!(matches!(error, GatewayError::AuthenticationFailed(_)));
    }

    #[test]
    fn require_bearer_rejects_missing_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer"));

        let error = require_bearer(&headers).expect_err("should reject missing token");
        assert!(matches!(error, GatewayError::AuthenticationFailed(_)));
    }

    #[test]
    fn require_bearer_rejects_wrong_scheme() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Basic dXNlcg=="));

        let error = require_bearer(&headers).expect_err("should reject wrong scheme");
        assert!(matches!(error, GatewayError::AuthenticationFailed(_)));
    }
}
