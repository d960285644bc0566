//! Password hashing - PBKDF2-HMAC-SHA256 with a fixed, shared salt.
//!
//! Every stored credential is `base64(PBKDF2(HMAC-SHA256, plain, salt, 100_000, 32))`.
//! The salt is the same for all users so existing hashes stay verifiable; identical
//! passwords therefore hash identically across accounts. Moving to per-user salts
//! changes the stored document shape and needs a migration.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use pbkdf2::pbkdf2_hmac_array;
use sha2::Sha256;

use crate::constants::{
    DEFAULT_PASSWORD_SALT, PASSWORD_HASH_LENGTH, PASSWORD_SALT_LENGTH, PBKDF2_ITERATIONS,
};
use crate::error::{DomainError, DomainResult};

/// Hashed password value object.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    hash: String,
}

// Don't expose hash in debug output
impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password")
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

impl Password {
    /// Get the hash string for storage.
    pub fn as_str(&self) -> &str {
        &self.hash
    }

    /// Consume and return the hash string.
    pub fn into_string(self) -> String {
        self.hash
    }
}

/// Derives password hashes.
///
/// Hashing is deterministic: the same plaintext always yields the same hash,
/// which is what login verification relies on.
#[derive(Clone)]
pub struct PasswordHasher {
    salt: [u8; PASSWORD_SALT_LENGTH],
    iterations: u32,
}

impl std::fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("salt", &"[REDACTED]")
            .field("iterations", &self.iterations)
            .finish()
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self {
            salt: DEFAULT_PASSWORD_SALT,
            iterations: PBKDF2_ITERATIONS,
        }
    }
}

impl PasswordHasher {
    /// Hasher with the built-in salt and iteration count.
    pub fn new() -> Self {
        Self::default()
    }

    /// Hasher with a different fixed salt.
    pub fn with_salt(salt: [u8; PASSWORD_SALT_LENGTH]) -> Self {
        Self {
            salt,
            ..Self::default()
        }
    }

    /// Hasher with a fixed salt given as base64 (as found in settings files).
    ///
    /// # Errors
    /// Returns a password error if the value is not base64 or not 16 bytes long.
    pub fn from_base64_salt(encoded: &str) -> DomainResult<Self> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| DomainError::password(format!("Salt is not valid base64: {}", e)))?;

        let salt: [u8; PASSWORD_SALT_LENGTH] = bytes.try_into().map_err(|b: Vec<u8>| {
            DomainError::password(format!(
                "Salt must be {} bytes, got {}",
                PASSWORD_SALT_LENGTH,
                b.len()
            ))
        })?;

        Ok(Self::with_salt(salt))
    }

    /// Override the iteration count.
    ///
    /// Hashes produced with anything other than the default count do not verify
    /// against stored credentials; intended for tests.
    pub fn with_iterations(mut self, iterations: u32) -> Self {
        self.iterations = iterations;
        self
    }

    /// Hash a plaintext password.
    pub fn hash(&self, plain_text: &str) -> Password {
        let key = pbkdf2_hmac_array::<Sha256, PASSWORD_HASH_LENGTH>(
            plain_text.as_bytes(),
            &self.salt,
            self.iterations,
        );
        Password {
            hash: STANDARD.encode(key),
        }
    }

    /// Compare a plaintext password against a stored hash (exact equality).
    ///
    /// Always derives the hash, so a missing credential (`""`) costs the same.
    pub fn verify(&self, plain_text: &str, stored_hash: &str) -> bool {
        self.hash(plain_text).as_str() == stored_hash
    }
}
