//! Wallet and signer addresses
//!
//! An address is the 20-byte RIPEMD160(SHA256(pubkey)) fingerprint of a
//! secp256k1 public key, displayed as a Base58Check string (version byte
//! plus a 4-byte double-SHA256 checksum).

use ripemd::Ripemd160;
use secp256k1::PublicKey;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha2::Digest;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::hash::{double_sha256, sha256};

/// Base58Check version byte for addresses
const ADDRESS_VERSION: u8 = 0x35;

/// Errors from address parsing
#[derive(Error, Debug, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid base58 encoding")]
    InvalidEncoding,
    #[error("Invalid address length")]
    InvalidLength,
    #[error("Invalid address version byte")]
    InvalidVersion,
    #[error("Address checksum mismatch")]
    ChecksumMismatch,
}

/// A 20-byte account identity
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// The all-zero address; never a valid signer
    pub const ZERO: Address = Address([0u8; 20]);

    /// Derive an address from a public key:
    /// RIPEMD160(SHA256(compressed pubkey))
    pub fn from_public_key(public_key: &PublicKey) -> Self {
        let sha = sha256(&public_key.serialize());
        let mut ripemd = Ripemd160::new();
        ripemd.update(sha);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&ripemd.finalize());
        Self(bytes)
    }

    /// Derive an address from a 32-byte configuration hash:
    /// RIPEMD160(sha256 output). Used for the wallet's own identity.
    pub fn from_config_hash(hash: &[u8; 32]) -> Self {
        let mut ripemd = Ripemd160::new();
        ripemd.update(hash);
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&ripemd.finalize());
        Self(bytes)
    }

    /// Build an address from raw bytes; fails unless exactly 20 bytes
    pub fn from_slice(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != 20 {
            return Err(AddressError::InvalidLength);
        }
        let mut buf = [0u8; 20];
        buf.copy_from_slice(bytes);
        Ok(Self(buf))
    }

    /// Raw address bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// True for the all-zero address
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Base58Check encode: version || bytes || checksum
    pub fn to_base58(&self) -> String {
        let mut payload = vec![ADDRESS_VERSION];
        payload.extend_from_slice(&self.0);
        let checksum = double_sha256(&payload);
        payload.extend_from_slice(&checksum[..4]);
        bs58::encode(payload).into_string()
    }

    /// Parse a Base58Check address string
    pub fn from_base58(s: &str) -> Result<Self, AddressError> {
        let payload = bs58::decode(s)
            .into_vec()
            .map_err(|_| AddressError::InvalidEncoding)?;
        if payload.len() != 25 {
            return Err(AddressError::InvalidLength);
        }
        if payload[0] != ADDRESS_VERSION {
            return Err(AddressError::InvalidVersion);
        }
        let checksum = double_sha256(&payload[..21]);
        if payload[21..] != checksum[..4] {
            return Err(AddressError::ChecksumMismatch);
        }
        Self::from_slice(&payload[1..21])
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_base58())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_base58())
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_base58(s)
    }
}

// Serialize as the Base58Check string so addresses stay readable in JSON
// and usable as map keys.
impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_base58())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct AddressVisitor;

        impl Visitor<'_> for AddressVisitor {
            type Value = Address;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a Base58Check address string")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Address, E> {
                Address::from_base58(v).map_err(de::Error::custom)
            }
        }

        deserializer.deserialize_str(AddressVisitor)
    }
}
