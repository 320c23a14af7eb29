//! ECDSA key management
//!
//! Provides key pair generation, recoverable signing, and signer recovery
//! using the secp256k1 elliptic curve. Signatures are 65 bytes on the wire:
//! the 64-byte compact signature followed by a one-byte recovery id, so the
//! signing public key (and thus the signer's address) can be recovered from
//! the signature and digest alone.

use rand::rngs::OsRng;
use secp256k1::ecdsa::{RecoverableSignature, RecoveryId};
use secp256k1::{Message, PublicKey, Secp256k1, SecretKey};
use thiserror::Error;

use super::address::Address;

/// Wire length of a recoverable signature
pub const SIGNATURE_LEN: usize = 65;

/// Errors that can occur during key operations
#[derive(Error, Debug)]
pub enum KeyError {
    #[error("Invalid private key")]
    InvalidPrivateKey,
    #[error("Invalid public key")]
    InvalidPublicKey,
    #[error("Invalid signature")]
    InvalidSignature,
    #[error("Signer recovery failed")]
    RecoveryFailed,
    #[error("Secp256k1 error: {0}")]
    Secp256k1Error(#[from] secp256k1::Error),
}

/// A key pair consisting of a private key and its corresponding public key
#[derive(Clone)]
pub struct KeyPair {
    pub secret_key: SecretKey,
    pub public_key: PublicKey,
}

impl KeyPair {
    /// Generate a new random key pair
    pub fn generate() -> Self {
        let secp = Secp256k1::new();
        let (secret_key, public_key) = secp.generate_keypair(&mut OsRng);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from an existing secret key
    pub fn from_secret_key(secret_key: SecretKey) -> Self {
        let secp = Secp256k1::new();
        let public_key = PublicKey::from_secret_key(&secp, &secret_key);
        Self {
            secret_key,
            public_key,
        }
    }

    /// Create a key pair from a hex-encoded private key
    pub fn from_private_key_hex(hex_key: &str) -> Result<Self, KeyError> {
        let bytes = hex::decode(hex_key).map_err(|_| KeyError::InvalidPrivateKey)?;
        let secret_key = SecretKey::from_slice(&bytes).map_err(|_| KeyError::InvalidPrivateKey)?;
        Ok(Self::from_secret_key(secret_key))
    }

    /// Get the private key as a hex string
    pub fn private_key_hex(&self) -> String {
        hex::encode(self.secret_key.secret_bytes())
    }

    /// Get the public key as a hex string (compressed format)
    pub fn public_key_hex(&self) -> String {
        hex::encode(self.public_key.serialize())
    }

    /// The address derived from this key pair's public key
    pub fn address(&self) -> Address {
        Address::from_public_key(&self.public_key)
    }

    /// Sign a 32-byte digest, producing a 65-byte recoverable signature
    pub fn sign(&self, digest: &[u8; 32]) -> Result<Vec<u8>, KeyError> {
        sign_recoverable(&self.secret_key, digest)
    }
}

/// Sign a 32-byte digest with a secret key; returns compact sig || recovery id
pub fn sign_recoverable(secret_key: &SecretKey, digest: &[u8; 32]) -> Result<Vec<u8>, KeyError> {
    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let signature = secp.sign_ecdsa_recoverable(&message, secret_key);
    let (recovery_id, compact) = signature.serialize_compact();

    let mut bytes = Vec::with_capacity(SIGNATURE_LEN);
    bytes.extend_from_slice(&compact);
    bytes.push(recovery_id.to_i32() as u8);
    Ok(bytes)
}

/// Recover the signing address from a 65-byte signature over a digest.
///
/// A structurally valid signature always recovers *some* address; callers
/// must compare the result against the claimed signer.
pub fn recover_signer(digest: &[u8; 32], signature: &[u8]) -> Result<Address, KeyError> {
    if signature.len() != SIGNATURE_LEN {
        return Err(KeyError::InvalidSignature);
    }

    let recovery_id = RecoveryId::from_i32(signature[64] as i32)
        .map_err(|_| KeyError::InvalidSignature)?;
    let sig = RecoverableSignature::from_compact(&signature[..64], recovery_id)
        .map_err(|_| KeyError::InvalidSignature)?;

    let secp = Secp256k1::new();
    let message = Message::from_digest_slice(digest)?;
    let public_key = secp
        .recover_ecdsa(&message, &sig)
        .map_err(|_| KeyError::RecoveryFailed)?;

    Ok(Address::from_public_key(&public_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::sha256;

    #[test]
    fn test_key_pair_generation() {
        let kp = KeyPair::generate();
        assert!(!kp.private_key_hex().is_empty());
        assert!(!kp.public_key_hex().is_empty());
        assert!(!kp.address().is_zero());
    }

    #[test]
    fn test_sign_and_recover() {
        let kp = KeyPair::generate();
        let digest = sha256(b"authorize payment 42");

        let signature = kp.sign(&digest).unwrap();
        assert_eq!(signature.len(), SIGNATURE_LEN);

        let recovered = recover_signer(&digest, &signature).unwrap();
        assert_eq!(recovered, kp.address());
    }

    #[test]
    fn test_recover_wrong_digest_yields_other_address() {
        let kp = KeyPair::generate();
        let digest = sha256(b"the real message");
        let other = sha256(b"a forged message");

        let signature = kp.sign(&digest).unwrap();
        // Recovery over a different digest either fails outright or
        // produces an address that is not the signer's.
        if let Ok(addr) = recover_signer(&other, &signature) {
            assert_ne!(addr, kp.address());
        }
    }

    #[test]
    fn test_malformed_signature_rejected() {
        let digest = sha256(b"msg");
        assert!(matches!(
            recover_signer(&digest, &[0u8; 10]),
            Err(KeyError::InvalidSignature)
        ));
        // Recovery id out of range
        let mut sig = vec![1u8; SIGNATURE_LEN];
        sig[64] = 9;
        assert!(recover_signer(&digest, &sig).is_err());
    }

    #[test]
    fn test_key_pair_from_hex() {
        let kp1 = KeyPair::generate();
        let private_hex = kp1.private_key_hex();

        let kp2 = KeyPair::from_private_key_hex(&private_hex).unwrap();
        assert_eq!(kp1.public_key_hex(), kp2.public_key_hex());
        assert_eq!(kp1.address(), kp2.address());
    }
}
