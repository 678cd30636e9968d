//! Deterministic Byte Stream
//!
//! Unbounded byte sequence derived from `(serverSeed, clientSeed, nonce)`.
//!
//! The stream is split into 32-byte pages. Page `cursor` is
//! `HMAC-SHA256(key = serverSeed, msg = "{clientSeed}:{nonce}:{cursor}")`,
//! and its bytes are yielded in order before the cursor advances.
//!
//! # Determinism Guarantee
//!
//! Two streams built from the same arguments yield identical bytes. Nothing is
//! cached between streams, so any number of them can run on different threads.

use super::hash::{Digest256, KeyedHasher};

/// Bytes per keyed-hash page.
pub const PAGE_SIZE: usize = 32;

/// Lazy, restartable byte stream for one round.
///
/// # Example
///
/// ```
/// use plinko_audit::core::stream::ByteStream;
///
/// let mut stream = ByteStream::new("a]Y`yJj5B=Kc5FD", "test", 0);
/// let bytes: Vec<u8> = stream.by_ref().take(4).collect();
/// assert_eq!(bytes, vec![0x2f, 0x6b, 0xd8, 0x41]);
/// ```
#[derive(Clone, Debug)]
pub struct ByteStream<'a> {
    server_seed: &'a str,
    client_seed: &'a str,
    nonce: u64,
    cursor: u64,
    page: Digest256,
    offset: usize,
}

impl<'a> ByteStream<'a> {
    /// Create a stream positioned at the first byte of page 0.
    pub fn new(server_seed: &'a str, client_seed: &'a str, nonce: u64) -> Self {
        let page = compute_page(server_seed, client_seed, nonce, 0);
        Self {
            server_seed,
            client_seed,
            nonce,
            cursor: 0,
            page,
            offset: 0,
        }
    }

    /// Rewind to the first byte.
    pub fn restart(&mut self) {
        if self.cursor != 0 {
            self.cursor = 0;
            self.page = compute_page(self.server_seed, self.client_seed, self.nonce, 0);
        }
        self.offset = 0;
    }

    /// Index of the page currently being consumed.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    /// Read the next `N` bytes.
    pub fn next_array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        for slot in out.iter_mut() {
            *slot = self.next_byte();
        }
        out
    }

    /// Read the next byte, advancing to a new page when the current one is spent.
    #[inline]
    pub fn next_byte(&mut self) -> u8 {
        if self.offset == PAGE_SIZE {
            self.cursor += 1;
            self.page = compute_page(self.server_seed, self.client_seed, self.nonce, self.cursor);
            self.offset = 0;
        }
        let byte = self.page[self.offset];
        self.offset += 1;
        byte
    }
}

impl Iterator for ByteStream<'_> {
    type Item = u8;

    #[inline]
    fn next(&mut self) -> Option<u8> {
        Some(self.next_byte())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (usize::MAX, None)
    }
}

/// Compute one 32-byte page of the stream.
pub fn compute_page(server_seed: &str, client_seed: &str, nonce: u64, cursor: u64) -> Digest256 {
    let mut hasher = KeyedHasher::new(server_seed.as_bytes());
    hasher.update(client_seed.as_bytes());
    hasher.update(b":");
    hasher.update_decimal(nonce);
    hasher.update(b":");
    hasher.update_decimal(cursor);
    hasher.finalize()
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::hash::hmac_sha256;

    const SEED: &str = "a]Y`yJj5B=Kc5FD";

    #[test]
    fn test_stream_known_prefix() {
        // These bytes must never change! Every recorded round depends on them.
        let bytes: Vec<u8> = ByteStream::new(SEED, "test", 0).take(40).collect();
        assert_eq!(
            hex::encode(bytes),
            "2f6bd8412a6a86ce9cf22d313df4ecdc137e6ac88403f17fff9ccdc84f6340808ddcd5fe40387b27"
        );
    }

    #[test]
    fn test_page_message_format() {
        assert_eq!(
            compute_page(SEED, "test", 7, 3),
            hmac_sha256(SEED.as_bytes(), b"test:7:3")
        );
    }

    #[test]
    fn test_crosses_page_boundary() {
        let mut stream = ByteStream::new("server", "client", 9);
        let first: Vec<u8> = stream.by_ref().take(PAGE_SIZE).collect();
        assert_eq!(stream.cursor(), 0);

        let next = stream.next_byte();
        assert_eq!(stream.cursor(), 1);
        assert_eq!(first.as_slice(), &compute_page("server", "client", 9, 0)[..]);
        assert_eq!(next, compute_page("server", "client", 9, 1)[0]);
    }

    #[test]
    fn test_restart_reproduces_sequence() {
        let mut stream = ByteStream::new("server", "client", 1);
        let first: Vec<u8> = stream.by_ref().take(100).collect();

        stream.restart();
        let second: Vec<u8> = stream.by_ref().take(100).collect();

        assert_eq!(first, second);
        assert_eq!(stream.cursor(), 3);
    }

    #[test]
    fn test_independent_streams_agree() {
        let a: Vec<u8> = ByteStream::new("s", "c", 5).take(70).collect();
        let b: Vec<u8> = ByteStream::new("s", "c", 5).take(70).collect();
        assert_eq!(a, b);

        let c: Vec<u8> = ByteStream::new("s", "c", 6).take(70).collect();
        assert_ne!(a, c);
    }

    #[test]
    fn test_next_array() {
        let mut stream = ByteStream::new(SEED, "test", 0);
        assert_eq!(stream.next_array::<4>(), [0x2f, 0x6b, 0xd8, 0x41]);
        assert_eq!(stream.next_array::<2>(), [0x2a, 0x6a]);
    }
}
