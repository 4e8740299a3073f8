//! Bearer-token sessions
//!
//! Signup mints a random 32-byte token; only its SHA-256 digest is stored.
//! Every authenticated handler resolves the `Authorization: Bearer` header
//! to an explicit [`Session`] value and passes it down. There is no
//! ambient current-user state anywhere in the daemon.

use axum::http::HeaderMap;
use levelup_common::error::LevelUpError;
use levelup_common::types::Role;
use rand::RngCore;
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Resolved identity for one request.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: Uuid,
    pub role: Role,
    pub email: String,
}

impl Session {
    /// Admin gate for the admin routes.
    pub fn require_admin(&self) -> Result<(), LevelUpError> {
        if self.role == Role::Admin {
            Ok(())
        } else {
            Err(LevelUpError::Forbidden("admin"))
        }
    }
}

/// Mint a fresh session token. Returned once to the caller; the store only
/// ever sees the digest.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// SHA-256 digest of a token, hex encoded, as stored in the users table.
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Pull the bearer token out of the request headers.
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, LevelUpError> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(LevelUpError::Unauthorized)?
        .to_str()
        .map_err(|_| LevelUpError::Unauthorized)?;
    value
        .strip_prefix("Bearer ")
        .ok_or(LevelUpError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_unique_and_hex() {
        let a = generate_token();
        let b = generate_token();
        assert_ne!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_digest_is_deterministic_and_not_the_token() {
        let token = generate_token();
        assert_eq!(token_digest(&token), token_digest(&token));
        assert_ne!(token_digest(&token), token);
    }

    #[test]
    fn test_bearer_extraction() {
        let mut headers = HeaderMap::new();
        assert!(bearer_token(&headers).is_err());

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Bearer abc123".parse().unwrap(),
        );
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");

        headers.insert(
            axum::http::header::AUTHORIZATION,
            "Basic abc123".parse().unwrap(),
        );
        assert!(bearer_token(&headers).is_err());
    }

    #[test]
    fn test_admin_gate() {
        let session = Session {
            user_id: Uuid::new_v4(),
            role: Role::User,
            email: "u@example.com".into(),
        };
        assert!(matches!(
            session.require_admin().unwrap_err(),
            LevelUpError::Forbidden(_)
        ));
    }
}
