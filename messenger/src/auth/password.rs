//! Password hashing and verification.

use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("invalid argon2 parameters: {0}")]
    InvalidParams(String),

    #[error("hash password: {0}")]
    Hash(String),

    #[error("stored digest is not a valid PHC string: {0}")]
    InvalidDigest(String),
}

/// Argon2 hashing parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Argon2Params {
    fn to_argon2(self) -> Result<Argon2<'static>, PasswordError> {
        let params = Params::new(self.memory_kib, self.iterations, self.parallelism, None)
            .map_err(|e| PasswordError::InvalidParams(e.to_string()))?;

        Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
    }
}

impl Default for Argon2Params {
    /// Argon2id RFC recommendations
    fn default() -> Self {
        Self {
            memory_kib: 19456, // 19 MB
            iterations: 2,
            parallelism: 1,
        }
    }
}

/// Hash a password with Argon2id into a PHC string.
pub fn hash_string_with_params(input: &str, params: Argon2Params) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = params.to_argon2()?;

    let hash = argon2
        .hash_password(input.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Verify a password against a stored digest.
///
/// Verification uses the parameters embedded in the digest, so digests produced
/// under older settings keep verifying after the configured parameters change.
pub fn verify_string(input: &str, hash: &str) -> Result<bool, PasswordError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|e| PasswordError::InvalidDigest(e.to_string()))?;

    let argon2 = Argon2::default();
    Ok(argon2.verify_password(input.as_bytes(), &parsed_hash).is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Small parameters keep the tests fast.
    const FAST: Argon2Params = Argon2Params {
        memory_kib: 128,
        iterations: 1,
        parallelism: 1,
    };

    #[test]
    fn test_string_hashing() {
        let input = "test_password_123";
        let hash = hash_string_with_params(input, FAST).unwrap();

        assert!(!hash.is_empty());
        assert_ne!(hash, input);
        assert!(verify_string(input, &hash).unwrap());
        assert!(!verify_string("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_same_input_different_hashes() {
        let input = "same_password";

        let hash1 = hash_string_with_params(input, FAST).unwrap();
        let hash2 = hash_string_with_params(input, FAST).unwrap();

        // Salted
        assert_ne!(hash1, hash2);
        assert!(verify_string(input, &hash1).unwrap());
        assert!(verify_string(input, &hash2).unwrap());
    }

    #[test]
    fn test_default_params_hash_verifies() {
        let hash = hash_string_with_params("pw", Argon2Params::default()).unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_string("pw", &hash).unwrap());
    }

    #[test]
    fn test_unparseable_digest() {
        assert!(matches!(verify_string("pw", "not-a-digest"), Err(PasswordError::InvalidDigest(_))));
    }

    #[test]
    fn test_zero_memory_is_rejected() {
        let params = Argon2Params {
            memory_kib: 0,
            ..FAST
        };
        assert!(matches!(hash_string_with_params("pw", params), Err(PasswordError::InvalidParams(_))));
    }
}
