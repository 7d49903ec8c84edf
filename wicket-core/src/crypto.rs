//! Random token generation and token hashing
//!
//! Opaque session tokens are 256-bit random values. Storage keeps only their
//! SHA256 digest, so a leaked session table cannot be replayed.
//!
//! SHA256 is adequate here because the input has full entropy; low-entropy
//! secrets (passwords) go through [`crate::password`] instead.

use rand::{TryRngCore, rngs::OsRng};
use sha2::{Digest, Sha256};

/// Generate a cryptographically secure random token.
///
/// Produces 32 random bytes encoded as URL-safe base64 (43 characters).
///
/// # Panics
///
/// Panics if the OS random number generator fails. This indicates a critical
/// system failure (e.g., /dev/urandom unavailable) from which recovery is not
/// possible for security-sensitive operations.
pub fn generate_secure_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");
    base64::Engine::encode(&base64::engine::general_purpose::URL_SAFE_NO_PAD, bytes)
}

/// Hash a token for storage using SHA256, hex-encoded.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
