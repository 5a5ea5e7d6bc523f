//! Argon2id password hashing.
//!
//! Hashes are stored as PHC strings so the salt and parameters travel with them.

use argon2::Argon2;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};

use crate::error::DocumentServiceError;

pub fn hash_password(password: &str) -> Result<String, DocumentServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| DocumentServiceError::Internal(format!("Failed to hash password: {e}")))
}

/// `Ok(false)` on mismatch; `Err` only when the stored hash is unreadable.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, DocumentServiceError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| DocumentServiceError::Internal(format!("Stored password hash is invalid: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(DocumentServiceError::Internal(format!(
            "Failed to verify password: {e}"
        ))),
    }
}
