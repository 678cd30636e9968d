//! Cryptographic primitives.
//!
//! Everything here is deterministic: identical inputs give identical bytes on
//! every platform.

pub mod hash;
pub mod stream;

// Re-export core types
pub use hash::{hmac_sha256, sha256, sha256_hex, Digest256};
pub use stream::{ByteStream, PAGE_SIZE};
