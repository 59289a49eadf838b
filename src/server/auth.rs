//! HTTP Basic authentication against the configured authors

use anyhow::anyhow;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use axum_extra::{
    headers::{authorization::Basic, Authorization},
    TypedHeader,
};

use super::SharedState;
use crate::error::Error;

/// Hash a password for the `password_hash` field of an author
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow!("failed to hash password: {}", e))
}

/// Check `password` against an argon2 hash; a malformed hash never matches
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            if !hash.is_empty() {
                tracing::warn!("Unusable password hash: {}", e);
            }
            false
        }
    }
}

/// The author a request is authenticated as
#[derive(Debug, Clone)]
pub struct AuthenticatedAuthor {
    pub username: String,
}

#[async_trait]
impl FromRequestParts<SharedState> for AuthenticatedAuthor {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &SharedState,
    ) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(basic)) =
            TypedHeader::<Authorization<Basic>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::Unauthorized)?;

        let author = state
            .config
            .author(basic.username())
            .ok_or(Error::Unauthorized)?;

        // Hash verification runs on the blocking pool
        let password = basic.password().to_string();
        let hash = author.password_hash.clone();
        let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .unwrap_or(false);

        if !verified {
            tracing::warn!("Rejected credentials for '{}'", basic.username());
            return Err(Error::Unauthorized);
        }

        Ok(Self {
            username: author.username.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("s3cret").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_password("", ""));
        assert!(!verify_password("s3cret", "plain-text"));
    }
}
