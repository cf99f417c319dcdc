use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::PasswordHash;
use argon2::password_hash::PasswordHasher as Argon2PasswordHasher;
use argon2::password_hash::PasswordVerifier;
use argon2::password_hash::SaltString;
use argon2::Argon2;

use super::errors::PasswordError;

/// Credential verifier.
///
/// Hashes secrets into PHC strings (Argon2id, salt embedded in the hash)
/// and compares plaintext secrets against stored hashes.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher;

impl PasswordHasher {
    /// Create a new password hasher instance.
    pub fn new() -> Self {
        Self
    }

    /// Generate a fresh random salt.
    ///
    /// # Returns
    /// B64-encoded salt suitable for [`PasswordHasher::hash_with_salt`]
    pub fn random_salt(&self) -> String {
        SaltString::generate(&mut OsRng).as_str().to_string()
    }

    /// Hash a secret with an explicit salt.
    ///
    /// Deterministic: the same secret and salt always yield the same hash.
    ///
    /// # Arguments
    /// * `password` - Plaintext secret
    /// * `salt` - B64-encoded salt (see [`PasswordHasher::random_salt`])
    ///
    /// # Errors
    /// * `InvalidSalt` - Salt is not valid B64 or has an unsupported length
    /// * `HashingFailed` - Argon2 rejected the input
    pub fn hash_with_salt(&self, password: &str, salt: &str) -> Result<String, PasswordError> {
        let salt =
            SaltString::from_b64(salt).map_err(|e| PasswordError::InvalidSalt(e.to_string()))?;

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| PasswordError::HashingFailed(e.to_string()))
    }

    /// Hash a secret with a freshly generated salt.
    ///
    /// # Errors
    /// * `HashingFailed` - Password hashing operation failed
    pub fn hash(&self, password: &str) -> Result<String, PasswordError> {
        self.hash_with_salt(password, &self.random_salt())
    }

    /// Compare a plaintext secret against a stored hash.
    ///
    /// Never fails: a malformed hash compares as `false`.
    pub fn verify(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed_hash) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hasher = PasswordHasher::new();
        let password = "my_secure_password";

        let hash = hasher.hash(password).expect("Failed to hash password");

        assert!(hash.starts_with("$argon2id"));
        assert!(hasher.verify(password, &hash));
        assert!(!hasher.verify("wrong_password", &hash));
    }

    #[test]
    fn test_hash_with_same_salt_is_deterministic() {
        let hasher = PasswordHasher::new();
        let salt = hasher.random_salt();

        let first = hasher.hash_with_salt("secret", &salt).unwrap();
        let second = hasher.hash_with_salt("secret", &salt).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_random_salts_differ() {
        let hasher = PasswordHasher::new();
        assert_ne!(hasher.random_salt(), hasher.random_salt());
    }

    #[test]
    fn test_hash_with_invalid_salt() {
        let hasher = PasswordHasher::new();
        let result = hasher.hash_with_salt("secret", "!");
        assert!(matches!(result, Err(PasswordError::InvalidSalt(_))));
    }

    #[test]
    fn test_verify_malformed_hash_is_false() {
        let hasher = PasswordHasher::new();
        assert!(!hasher.verify("password", "invalid_hash"));
        assert!(!hasher.verify("password", ""));
    }
}
