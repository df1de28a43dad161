//! Argon2 credential verifier implementation

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};

use crate::domain::result::{Error, Result};
use crate::ports::CredentialVerifier;

/// Argon2id password hashing with per-credential random salts
///
/// Hashes are stored as PHC strings, so parameters can change over time
/// without invalidating existing credentials.
#[derive(Debug, Default, Clone)]
pub struct Argon2Verifier;

impl Argon2Verifier {
    pub fn new() -> Self {
        Self
    }
}

impl CredentialVerifier for Argon2Verifier {
    fn hash(&self, password: &str) -> Result<String> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| Error::validation(format!("failed to hash password: {e}")))?;
        Ok(hash.to_string())
    }

    fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_round_trip() {
        let verifier = Argon2Verifier::new();
        let hash = verifier.hash("correct horse battery staple").unwrap();

        assert!(hash.starts_with("$argon2"));
        assert!(verifier.verify("correct horse battery staple", &hash));
        assert!(!verifier.verify("wrong password", &hash));
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let verifier = Argon2Verifier::new();
        let first = verifier.hash("same password").unwrap();
        let second = verifier.hash("same password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_garbage_hash_never_verifies() {
        let verifier = Argon2Verifier::new();
        assert!(!verifier.verify("anything", "not a phc string"));
        assert!(!verifier.verify("anything", ""));
    }
}
