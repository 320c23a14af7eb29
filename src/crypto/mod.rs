//! Cryptographic primitives for the wallet
//!
//! This module provides:
//! - SHA-256 hashing and injective field encoding
//! - 20-byte addresses with Base58Check display
//! - ECDSA key management and recoverable signatures (secp256k1)

pub mod address;
pub mod hash;
pub mod keys;

pub use address::{Address, AddressError};
pub use hash::{double_sha256, sha256, sha256_hex, FieldHasher};
pub use keys::{recover_signer, sign_recoverable, KeyError, KeyPair, SIGNATURE_LEN};
