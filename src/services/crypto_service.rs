use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ring::pbkdf2;
use ring::rand::{SecureRandom, SystemRandom};
use std::num::NonZeroU32;

use crate::types::errors::RemoteError;

/// PBKDF2 iteration count for password hashing.
const PBKDF2_ITERATIONS: u32 = 100_000;

/// Salt length in bytes for PBKDF2.
const SALT_LENGTH: usize = 16;

/// Derived hash length in bytes.
const HASH_LENGTH: usize = 32;

/// Entropy of issued access and refresh tokens, in bytes.
const TOKEN_LENGTH: usize = 32;

/// Trait defining the cryptographic operations the local record store needs.
pub trait CryptoServiceTrait {
    /// Hashes a password with PBKDF2-HMAC-SHA256.
    fn hash_password(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, RemoteError>;

    /// Checks a password against a stored hash in constant time.
    fn verify_password(&self, password: &str, salt: &[u8], hash: &[u8]) -> bool;

    /// Generates a cryptographically secure random salt.
    fn generate_salt(&self) -> Result<Vec<u8>, RemoteError>;

    /// Generates an opaque URL-safe bearer token.
    fn generate_token(&self) -> Result<String, RemoteError>;
}

/// Implementation of cryptographic services using the `ring` crate.
pub struct CryptoService {
    rng: SystemRandom,
    iterations: NonZeroU32,
}

impl CryptoService {
    /// Creates a new CryptoService instance.
    pub fn new() -> Self {
        Self::with_iterations(PBKDF2_ITERATIONS)
    }

    /// Uses a custom PBKDF2 work factor. A zero count falls back to the default.
    pub fn with_iterations(iterations: u32) -> Self {
        let default = NonZeroU32::MIN.saturating_add(PBKDF2_ITERATIONS - 1);
        Self {
            rng: SystemRandom::new(),
            iterations: NonZeroU32::new(iterations).unwrap_or(default),
        }
    }

    fn random_bytes(&self, length: usize) -> Result<Vec<u8>, RemoteError> {
        let mut bytes = vec![0u8; length];
        self.rng
            .fill(&mut bytes)
            .map_err(|_| RemoteError::Service("Failed to generate random bytes".to_string()))?;
        Ok(bytes)
    }
}

impl Default for CryptoService {
    fn default() -> Self {
        Self::new()
    }
}

impl CryptoServiceTrait for CryptoService {
    fn hash_password(&self, password: &str, salt: &[u8]) -> Result<Vec<u8>, RemoteError> {
        let mut hash = vec![0u8; HASH_LENGTH];
        pbkdf2::derive(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            password.as_bytes(),
            &mut hash,
        );
        Ok(hash)
    }

    fn verify_password(&self, password: &str, salt: &[u8], hash: &[u8]) -> bool {
        pbkdf2::verify(
            pbkdf2::PBKDF2_HMAC_SHA256,
            self.iterations,
            salt,
            password.as_bytes(),
            hash,
        )
        .is_ok()
    }

    fn generate_salt(&self) -> Result<Vec<u8>, RemoteError> {
        self.random_bytes(SALT_LENGTH)
    }

    fn generate_token(&self) -> Result<String, RemoteError> {
        Ok(URL_SAFE_NO_PAD.encode(self.random_bytes(TOKEN_LENGTH)?))
    }
}
