//! Authentication middleware
//!
//! Extracts and validates JWT tokens from requests, attaching the verified
//! [`Identity`] to the request extensions for downstream handlers.

use crate::auth::decode_token;
use crate::error::AppError;
use axum::http::header::AUTHORIZATION;
use axum::{extract::Request, middleware::Next, response::Response};
use tracing::debug;

/// Verify the bearer token and attach the caller's identity to the request.
///
/// Missing header, malformed header, and invalid/expired token all produce
/// the same `401` response; the distinction exists only in the debug log.
pub async fn auth_middleware(mut request: Request, next: Next) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let token = bearer_token(header_value)?;
    let claims = decode_token(token)?;

    request.extensions_mut().insert(claims.identity());

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header value.
fn bearer_token(header_value: Option<&str>) -> Result<&str, AppError> {
    let value = header_value.ok_or_else(|| {
        debug!("Missing authorization header");
        AppError::Unauthenticated
    })?;

    value.strip_prefix("Bearer ").ok_or_else(|| {
        debug!("Authorization header without Bearer prefix");
        AppError::Unauthenticated
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_token_after_bearer_prefix() {
        assert_eq!(bearer_token(Some("Bearer abc.def.ghi")).unwrap(), "abc.def.ghi");
    }

    #[test]
    fn missing_header_is_unauthenticated() {
        assert!(matches!(bearer_token(None), Err(AppError::Unauthenticated)));
    }

    #[test]
    fn non_bearer_scheme_is_unauthenticated() {
        assert!(matches!(
            bearer_token(Some("Basic dXNlcjpwdw==")),
            Err(AppError::Unauthenticated)
        ));
        assert!(matches!(
            bearer_token(Some("bearer lowercase-scheme")),
            Err(AppError::Unauthenticated)
        ));
    }
}
