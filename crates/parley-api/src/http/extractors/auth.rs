//! API key authentication extractor.
//!
//! Extracts and verifies API keys from:
//! - `Authorization: Bearer <key>` header
//! - `X-API-Key: <key>` header
//! - `?api_key=<key>` query parameter (browsers cannot set headers on
//!   WebSocket upgrades)
//!
//! Keys are SHA-256 hashed and resolved to their owning user.

use aes_gcm::aead::{OsRng, rand_core::RngCore};
use axum::extract::{FromRequestParts, Query};
use axum::http::request::Parts;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::http::error::AppError;
use crate::http::extractors::query::KeyQuery;
use crate::state::AppState;

/// Prefix of every generated key.
pub const API_KEY_PREFIX: &str = "parley_";

/// The caller, resolved from a valid API key.
#[derive(Debug, Clone, Copy)]
pub struct Authenticated {
    pub user_id: Uuid,
}

impl FromRequestParts<AppState> for Authenticated {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let api_key = extract_api_key(parts)?;
        let key_hash = hash_api_key(&api_key);

        match state.user_service.authenticate(&key_hash).await? {
            Some(user_id) => Ok(Authenticated { user_id }),
            None => Err(AppError::Unauthorized(
                "Invalid API key. Provide a valid key via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
            )),
        }
    }
}

/// Extract the API key from request headers or the query string.
fn extract_api_key(parts: &Parts) -> Result<String, AppError> {
    if let Some(auth) = parts.headers.get("authorization") {
        let auth_str = auth.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid Authorization header encoding".to_string())
        })?;
        if let Some(key) = auth_str.strip_prefix("Bearer ") {
            return Ok(key.trim().to_string());
        }
    }

    if let Some(key) = parts.headers.get("x-api-key") {
        let key_str = key.to_str().map_err(|_| {
            AppError::Unauthorized("Invalid X-API-Key header encoding".to_string())
        })?;
        return Ok(key_str.trim().to_string());
    }

    // A malformed query string reads as "no key".
    let from_query = Query::<KeyQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.api_key);
    if let Some(key) = from_query.filter(|k| !k.is_empty()) {
        return Ok(key);
    }

    Err(AppError::Unauthorized(
        "Missing API key. Provide via 'Authorization: Bearer <key>' or 'X-API-Key: <key>' header.".to_string(),
    ))
}

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// Generate a fresh plaintext key: the prefix plus 32 random bytes as hex.
pub fn generate_api_key() -> String {
    let mut key_bytes = [0u8; 32];
    OsRng.fill_bytes(&mut key_bytes);
    format!(
        "{API_KEY_PREFIX}{}",
        key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn parts(request: Request<()>) -> Parts {
        request.into_parts().0
    }

    #[test]
    fn bearer_header_wins() {
        let p = parts(
            Request::builder()
                .uri("/x?api_key=from-query")
                .header("authorization", "Bearer  abc ")
                .header("x-api-key", "other")
                .body(())
                .unwrap(),
        );
        assert_eq!(extract_api_key(&p).unwrap(), "abc");
    }

    #[test]
    fn x_api_key_header() {
        let p = parts(Request::builder().header("x-api-key", "k1").body(()).unwrap());
        assert_eq!(extract_api_key(&p).unwrap(), "k1");
    }

    #[test]
    fn query_parameter_fallback() {
        let p = parts(
            Request::builder()
                .uri("/ws/events?foo=1&api_key=k2")
                .body(())
                .unwrap(),
        );
        assert_eq!(extract_api_key(&p).unwrap(), "k2");
    }

    #[test]
    fn query_parameter_is_percent_decoded() {
        let p = parts(
            Request::builder()
                .uri("/ws/events?api_key=parley_ab%2Bcd%3D%26x&foo=1")
                .body(())
                .unwrap(),
        );
        assert_eq!(extract_api_key(&p).unwrap(), "parley_ab+cd=&x");
    }

    #[test]
    fn missing_key_is_unauthorized() {
        let p = parts(Request::builder().uri("/x?api_key=").body(()).unwrap());
        assert!(matches!(extract_api_key(&p), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn hash_is_lowercase_sha256_hex() {
        assert_eq!(
            hash_api_key("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn generated_keys_are_unique_and_well_formed() {
        let a = generate_api_key();
        let b = generate_api_key();
        assert_ne!(a, b);
        assert!(a.starts_with(API_KEY_PREFIX));
        let hex = &a[API_KEY_PREFIX.len()..];
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }
}
