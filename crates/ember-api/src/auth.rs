use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use crate::error::ApiError;

/// Extracts the session token from `Authorization: Bearer <token>`.
///
/// The token is an opaque bearer capability; whether it authorizes
/// anything is decided against the room in each handler, so extraction
/// only checks shape.
pub struct SessionToken(pub String);

impl<S> FromRequestParts<S> for SessionToken
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        match token {
            Some(token) => Ok(Self(token.to_string())),
            None => Err(ApiError::unauthorized("missing or malformed session token")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(value: Option<&str>) -> Result<SessionToken, ApiError> {
        let mut builder = Request::builder().uri("/");
        if let Some(value) = value {
            builder = builder.header(header::AUTHORIZATION, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        SessionToken::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn bearer_token_is_extracted() {
        let token = extract(Some("Bearer abc123")).await.unwrap();
        assert_eq!(token.0, "abc123");
    }

    #[tokio::test]
    async fn missing_or_malformed_header_is_rejected() {
        assert!(extract(None).await.is_err());
        assert!(extract(Some("abc123")).await.is_err());
        assert!(extract(Some("Bearer ")).await.is_err());
        assert!(extract(Some("Basic abc123")).await.is_err());
    }
}
