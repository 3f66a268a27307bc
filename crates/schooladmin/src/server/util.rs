use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::StatusCode;

use crate::api::SessionKey;
use crate::server::types::ApiErrorType;

/// Bearer credential of the calling dashboard user.
///
/// It is forwarded to the remote API and, hashed, identifies the caller's
/// editing session.
#[derive(Debug, Clone)]
pub struct BearerToken(pub String);

impl BearerToken {
    pub fn session_key(&self) -> SessionKey {
        SessionKey::from_token(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for BearerToken
where
    S: Send + Sync,
{
    type Rejection = ApiErrorType;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| missing("Authorization header is required"))?;

        parse_bearer(header)
            .map(|token| BearerToken(token.to_string()))
            .ok_or_else(|| missing("Authorization header must be a bearer token"))
    }
}

fn missing(message: &str) -> ApiErrorType {
    (StatusCode::UNAUTHORIZED, message, None).into()
}

/// Extracts the token from `Bearer <token>`, case-insensitive on the scheme.
fn parse_bearer(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bearer() {
        assert_eq!(parse_bearer("Bearer abc"), Some("abc"));
        assert_eq!(parse_bearer("bearer   abc "), Some("abc"));
        assert_eq!(parse_bearer("Basic abc"), None);
        assert_eq!(parse_bearer("Bearer "), None);
        assert_eq!(parse_bearer("abc"), None);
    }
}
