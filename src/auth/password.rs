//! Argon2 credential hashing for stored accounts.

use argon2::{
    password_hash::{self, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use thiserror::Error;
use tracing::error;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("stored credential is not an argon2 hash: {0}")]
    Malformed(String),
}

impl From<PasswordError> for AppError {
    fn from(e: PasswordError) -> Self {
        AppError::Internal(e.into())
    }
}

/// Signup rule for new passwords, counted in characters.
pub fn check_strength(plain: &str) -> Result<(), String> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        ));
    }
    Ok(())
}

pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "argon2 hashing failed");
            PasswordError::Hash(e.to_string())
        })
}

/// `Ok(false)` on a mismatch; `Err` only when the stored value is unusable.
pub fn verify_password(plain: &str, stored: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored).map_err(|e| {
        error!(error = %e, "stored credential unreadable");
        PasswordError::Malformed(e.to_string())
    })?;
    match Argon2::default().verify_password(plain.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Malformed(e.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashes_are_salted() {
        let a = hash_password("pancakes-for-dinner").unwrap();
        let b = hash_password("pancakes-for-dinner").unwrap();
        assert_ne!(a, b);
        assert!(a.starts_with("$argon2"));
        assert!(verify_password("pancakes-for-dinner", &a).unwrap());
        assert!(verify_password("pancakes-for-dinner", &b).unwrap());
    }

    #[test]
    fn wrong_password_does_not_verify() {
        let hash = hash_password("correct-horse-battery").unwrap();
        assert!(!verify_password("wrong-horse", &hash).unwrap());
    }

    #[test]
    fn plaintext_in_the_store_is_an_error() {
        // Rows holding raw passwords must never log anyone in.
        let err = verify_password("secret", "secret").unwrap_err();
        assert!(matches!(err, PasswordError::Malformed(_)));
        assert_eq!(AppError::from(err).status(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn strength_counts_characters() {
        assert!(check_strength("short").is_err());
        assert!(check_strength("ñññññññ").is_err());
        assert!(check_strength("long enough").is_ok());
    }
}
