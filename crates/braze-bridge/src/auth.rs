//! Subscriber handshake authentication.
//!
//! Exactly two credential forms are accepted, checked against the
//! pre-shared secret:
//!
//! - header: `Authorization: Bearer <secret>`
//! - query: `access_token=<secret>` anywhere in the query string
//!
//! Any other presentation is rejected before the WebSocket upgrade, so a
//! failed connection never sees a single frame. A bridge configured without
//! a secret accepts every connection.

use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;

/// Checks a connection's credentials against the configured secret.
pub fn authorize(secret: Option<&str>, headers: &HeaderMap, query: Option<&str>) -> bool {
    let Some(secret) = secret.filter(|s| !s.is_empty()) else {
        return true;
    };

    if let Some(value) = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok())
        && let Some(token) = value.strip_prefix("Bearer ")
        && token == secret
    {
        return true;
    }

    if let Some(query) = query {
        return query
            .split('&')
            .filter_map(|pair| pair.strip_prefix("access_token="))
            .any(|token| token == secret);
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn bearer(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    #[test]
    fn no_secret_accepts_everything() {
        assert!(authorize(None, &HeaderMap::new(), None));
        assert!(authorize(Some(""), &HeaderMap::new(), None));
    }

    #[test]
    fn bearer_header_matches() {
        assert!(authorize(Some("s3cret"), &bearer("Bearer s3cret"), None));
    }

    #[test]
    fn bearer_header_must_match_exactly() {
        assert!(!authorize(Some("s3cret"), &bearer("Bearer wrong"), None));
        assert!(!authorize(Some("s3cret"), &bearer("s3cret"), None));
        assert!(!authorize(Some("s3cret"), &bearer("bearer s3cret"), None));
    }

    #[test]
    fn query_token_matches() {
        assert!(authorize(
            Some("s3cret"),
            &HeaderMap::new(),
            Some("access_token=s3cret")
        ));
        assert!(authorize(
            Some("s3cret"),
            &HeaderMap::new(),
            Some("foo=1&access_token=s3cret")
        ));
    }

    #[test]
    fn wrong_or_absent_query_token_is_rejected() {
        assert!(!authorize(
            Some("s3cret"),
            &HeaderMap::new(),
            Some("access_token=nope")
        ));
        assert!(!authorize(Some("s3cret"), &HeaderMap::new(), Some("foo=1")));
        assert!(!authorize(Some("s3cret"), &HeaderMap::new(), None));
    }
}
