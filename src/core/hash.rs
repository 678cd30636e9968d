//! Hash Primitives
//!
//! SHA-256 and HMAC-SHA256 helpers used by:
//! - Server seed commitments
//! - The keyed byte stream behind every round
//! - The legacy path-counting resolver

use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

/// Hash output type (256 bits / 32 bytes)
pub type Digest256 = [u8; 32];

/// HMAC-SHA256 as used by the game's provably-fair construction.
pub type HmacSha256 = Hmac<Sha256>;

/// Compute the SHA-256 digest of arbitrary data.
pub fn sha256(data: &[u8]) -> Digest256 {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// SHA-256 digest rendered as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Compute `HMAC-SHA256(key, message)`.
///
/// HMAC accepts keys of any length, so this cannot fail.
pub fn hmac_sha256(key: &[u8], message: &[u8]) -> Digest256 {
    let mut mac = KeyedHasher::new(key);
    mac.update(message);
    mac.finalize()
}

/// Keyed digest rendered as lowercase hex.
pub fn hmac_sha256_hex(key: &[u8], message: &[u8]) -> String {
    hex::encode(hmac_sha256(key, message))
}

/// Incremental HMAC-SHA256.
///
/// Lets callers stream the message in pieces (`clientSeed`, `:`, nonce, ...)
/// without building an intermediate string.
pub struct KeyedHasher {
    mac: HmacSha256,
}

impl KeyedHasher {
    /// Create a hasher keyed with `key`.
    pub fn new(key: &[u8]) -> Self {
        // Hmac::new_from_slice only rejects keys for fixed-key MACs; HMAC takes any length.
        let mac = match HmacSha256::new_from_slice(key) {
            Ok(mac) => mac,
            Err(_) => unreachable!("HMAC accepts keys of any length"),
        };
        Self { mac }
    }

    /// Update with raw bytes.
    #[inline]
    pub fn update(&mut self, bytes: &[u8]) {
        self.mac.update(bytes);
    }

    /// Update with the decimal rendering of an integer.
    #[inline]
    pub fn update_decimal(&mut self, value: u64) {
        self.mac.update(value.to_string().as_bytes());
    }

    /// Finalize and return the digest.
    pub fn finalize(self) -> Digest256 {
        self.mac.finalize().into_bytes().into()
    }
}

/// Normalize a hex digest for comparison (trimmed, lowercase).
pub fn normalize_hex(value: &str) -> String {
    value.trim().to_ascii_lowercase()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sha256_known_vector() {
        // FIPS 180-2 "abc"
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_hmac_known_vector() {
        // RFC 4231 test case 2
        assert_eq!(
            hmac_sha256_hex(b"Jefe", b"what do ya want for nothing?"),
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_keyed_hasher_matches_one_shot() {
        let mut hasher = KeyedHasher::new(b"server");
        hasher.update(b"client");
        hasher.update(b":");
        hasher.update_decimal(42);
        hasher.update(b":");
        hasher.update_decimal(0);

        assert_eq!(hasher.finalize(), hmac_sha256(b"server", b"client:42:0"));
    }

    #[test]
    fn test_empty_key_is_accepted() {
        let a = hmac_sha256(b"", b"message");
        let b = hmac_sha256(b"", b"message");
        assert_eq!(a, b);
    }

    #[test]
    fn test_normalize_hex() {
        assert_eq!(normalize_hex("  ABCdef01\n"), "abcdef01");
    }
}
