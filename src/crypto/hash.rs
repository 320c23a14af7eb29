//! Cryptographic hashing utilities
//!
//! Provides the SHA-256 based hashing used for transaction digests,
//! wallet address derivation, and address checksums.

use sha2::{Digest, Sha256};

/// Computes SHA-256 hash of the input data
pub fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Computes double SHA-256 hash (SHA-256 of SHA-256)
/// Used for Base58Check address checksums
pub fn double_sha256(data: &[u8]) -> [u8; 32] {
    sha256(&sha256(data))
}

/// Computes SHA-256 hash and returns it as a hex string
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(sha256(data))
}

/// Incremental SHA-256 over a sequence of fields.
///
/// Each variable-width field is prefixed with its length as a big-endian
/// u64, so no two distinct field sequences produce the same byte stream.
/// Fixed-width fields (counters, tags) go through [`FieldHasher::fixed`]
/// without a prefix.
pub struct FieldHasher {
    inner: Sha256,
}

impl FieldHasher {
    /// Start a new field hash
    pub fn new() -> Self {
        Self {
            inner: Sha256::new(),
        }
    }

    /// Append a variable-width field, length-prefixed
    pub fn field(mut self, data: &[u8]) -> Self {
        self.inner.update((data.len() as u64).to_be_bytes());
        self.inner.update(data);
        self
    }

    /// Append a fixed-width field verbatim
    pub fn fixed(mut self, data: &[u8]) -> Self {
        self.inner.update(data);
        self
    }

    /// Finish and return the digest
    pub fn finish(self) -> [u8; 32] {
        self.inner.finalize().into()
    }
}

impl Default for FieldHasher {
    fn default() -> Self {
        Self::new()
    }
}
