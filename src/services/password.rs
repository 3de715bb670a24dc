// SPDX-License-Identifier: MIT

//! Password hashing with Argon2id.
//!
//! Hashing happens exactly once, at the explicit set-password operations;
//! nothing in the store layer re-hashes an already-hashed value.

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher as _, PasswordVerifier};

use crate::error::AppError;

/// Stateless Argon2id hasher with default parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordHasher;

impl PasswordHasher {
    pub fn new() -> Self {
        Self
    }

    /// Hash a plaintext password with a fresh random salt.
    pub fn hash(&self, plaintext: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(plaintext.as_bytes(), &salt)
            .map(|digest| digest.to_string())
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing failed: {}", e)))
    }

    /// Verify a plaintext against a stored digest.
    ///
    /// The comparison inside `verify_password` is constant-time; a
    /// malformed digest simply fails verification.
    pub fn verify(&self, plaintext: &str, digest: &str) -> bool {
        PasswordHash::new(digest)
            .map(|parsed| {
                Argon2::default()
                    .verify_password(plaintext.as_bytes(), &parsed)
                    .is_ok()
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_verify_round_trip() {
        let hasher = PasswordHasher::new();
        let digest = hasher.hash("correct horse battery staple").unwrap();

        assert!(hasher.verify("correct horse battery staple", &digest));
        assert!(!hasher.verify("correct horse battery stapl", &digest));
        assert!(!hasher.verify("", &digest));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = PasswordHasher::new();
        let a = hasher.hash("hunter2").unwrap();
        let b = hasher.hash("hunter2").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_verify_rejects_malformed_digest() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("anything", "not-a-phc-string"));
    }
}
