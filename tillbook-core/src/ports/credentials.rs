//! Credential verifier port - password hashing abstraction

use crate::domain::result::Result;

/// Hashes and compares passwords
///
/// The account and admin services depend on this trait; the concrete
/// algorithm lives in an adapter so tests can swap in a cheap one.
pub trait CredentialVerifier: Send + Sync {
    /// Hash a plaintext password into a storable string
    fn hash(&self, password: &str) -> Result<String>;

    /// Check a plaintext password against a stored hash
    fn verify(&self, password: &str, hash: &str) -> bool;
}
