//! Access passwords for protected links.
//!
//! Stored as Argon2id PHC strings (`$argon2id$v=19$...`).

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("password hashing failed: {0}")]
pub struct SecretError(String);

/// Hash a password with a fresh random salt
pub fn hash_secret(password: &str) -> Result<String, SecretError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| SecretError(e.to_string()))
}

/// Check a supplied password against a stored hash.
///
/// A malformed stored value never matches.
pub fn verify_secret(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash is malformed");
            false
        }
    }
}

pub fn is_argon2_hash(value: &str) -> bool {
    value.starts_with("$argon2")
}

/// Normalize a password from user input: an empty value means "no password".
/// Input is always hashed, even if it looks like a hash already.
pub fn process_new_secret(password: Option<&str>) -> Result<Option<String>, SecretError> {
    match password {
        Some(pwd) if !pwd.is_empty() => hash_secret(pwd).map(Some),
        _ => Ok(None),
    }
}

/// Password field read from a stored document: hashes are kept, plaintext
/// from the flat-file format is hashed.
pub fn process_stored_secret(password: Option<&str>) -> Result<Option<String>, SecretError> {
    match password {
        Some(pwd) if is_argon2_hash(pwd) => Ok(Some(pwd.to_string())),
        other => process_new_secret(other),
    }
}
