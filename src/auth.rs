//! Explicit caller identity, checked once at the pipeline boundary.
//!
//! No ambient session state: handlers that mutate the menu receive a
//! [`CallerIdentity`] value produced from the request's bearer token.

use axum::http::{header, HeaderMap};

use crate::error::ApiError;

/// Proof that the caller is allowed to mutate the menu.
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub subject: String,
}

/// Compare the request's `Authorization: Bearer` token against the
/// configured admin token.
pub fn authenticate(headers: &HeaderMap, admin_token: &str) -> Result<CallerIdentity, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    if token == admin_token {
        Ok(CallerIdentity {
            subject: "admin".to_string(),
        })
    } else {
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_valid_token_yields_identity() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer secret"),
        );
        let identity = authenticate(&headers, "secret").unwrap();
        assert_eq!(identity.subject, "admin");
    }

    #[test]
    fn test_missing_or_wrong_token_rejected() {
        let headers = HeaderMap::new();
        assert!(matches!(
            authenticate(&headers, "secret"),
            Err(ApiError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(
            header::AUTHORIZATION,
            HeaderValue::from_static("Bearer wrong"),
        );
        assert!(matches!(
            authenticate(&headers, "secret"),
            Err(ApiError::Unauthorized)
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, HeaderValue::from_static("secret"));
        assert!(matches!(
            authenticate(&headers, "secret"),
            Err(ApiError::Unauthorized)
        ));
    }
}
