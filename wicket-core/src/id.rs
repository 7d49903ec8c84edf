//! Prefixed identifier generation
//!
//! Users and products get identifiers of the form `{prefix}_{random}` where the
//! random part is 96 bits from the OS RNG, base64 URL-safe encoded. The prefix
//! makes identifiers self-describing in logs and URLs (`usr_…`, `prd_…`).

use base64::{Engine, prelude::BASE64_URL_SAFE_NO_PAD};
use rand::{TryRngCore, rngs::OsRng};

/// Number of random bytes behind every generated identifier.
const ID_ENTROPY_BYTES: usize = 12;

/// Generate a prefixed ID with 96 bits of entropy
///
/// # Panics
///
/// Panics if the OS random number generator is unavailable.
pub fn generate_prefixed_id(prefix: &str) -> String {
    let mut bytes = [0u8; ID_ENTROPY_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .expect("OS RNG failure - system entropy source unavailable");

    let encoded = BASE64_URL_SAFE_NO_PAD.encode(bytes);

    format!("{prefix}_{encoded}")
}

/// Validate that a prefixed ID has the expected format
///
/// Returns `true` when `id` is `{expected_prefix}_` followed by valid URL-safe
/// base64 carrying at least 96 bits.
pub fn validate_prefixed_id(id: &str, expected_prefix: &str) -> bool {
    let Some(random_part) = id
        .strip_prefix(expected_prefix)
        .and_then(|rest| rest.strip_prefix('_'))
    else {
        return false;
    };

    match BASE64_URL_SAFE_NO_PAD.decode(random_part) {
        Ok(decoded) => decoded.len() >= ID_ENTROPY_BYTES,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_prefixed_id() {
        let id = generate_prefixed_id("usr");
        assert!(id.starts_with("usr_"));
        assert_eq!(id.len(), "usr_".len() + 16);

        let id2 = generate_prefixed_id("usr");
        assert_ne!(id, id2);
    }

    #[test]
    fn test_validate_prefixed_id() {
        let id = generate_prefixed_id("prd");
        assert!(validate_prefixed_id(&id, "prd"));
        assert!(!validate_prefixed_id(&id, "usr"));

        assert!(!validate_prefixed_id("prd", "prd"));
        assert!(!validate_prefixed_id("prd_", "prd"));
        assert!(!validate_prefixed_id("prd_invalid!", "prd"));
        assert!(!validate_prefixed_id("prdx_AAAAAAAAAAAAAAAA", "prd"));
    }

    #[test]
    fn test_id_is_url_safe() {
        let id = generate_prefixed_id("usr");
        assert!(
            id.chars()
                .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        );
    }
}
