//! Signer registry
//!
//! The authoritative set of addresses allowed to confirm, with the
//! threshold it must stay able to satisfy. Membership and removal are
//! O(1) through the shared indexed set. Mutation happens only when an
//! AddSigner/RemoveSigner transaction executes.

use serde::{Deserialize, Serialize};

use crate::crypto::Address;
use crate::wallet::index::IndexedSet;
use crate::wallet::wallet::WalletError;

/// The k-of-n signer set
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignerRegistry {
    members: IndexedSet<Address>,
    threshold: usize,
}

impl SignerRegistry {
    /// Create a registry from the initial signer list.
    ///
    /// Rejects an empty list, a zero address, a duplicate, and a
    /// threshold outside `[1, n]`.
    pub fn new(signers: &[Address], threshold: usize) -> Result<Self, WalletError> {
        if signers.is_empty() {
            return Err(WalletError::EmptySigners);
        }
        if threshold == 0 || threshold > signers.len() {
            return Err(WalletError::InvalidThreshold {
                threshold,
                signers: signers.len(),
            });
        }

        let mut members = IndexedSet::new();
        for signer in signers {
            if signer.is_zero() {
                return Err(WalletError::ZeroAddress);
            }
            if !members.insert(*signer) {
                return Err(WalletError::DuplicateSigner(*signer));
            }
        }

        Ok(Self { members, threshold })
    }

    /// O(1) membership test
    pub fn is_signer(&self, address: &Address) -> bool {
        self.members.contains(address)
    }

    /// Number of signers (n)
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True when the registry holds no signers (never after construction)
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The confirmation threshold (k)
    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Current signers, in registry order
    pub fn signers(&self) -> &[Address] {
        self.members.as_slice()
    }

    /// A signer's position in the registry order
    pub fn position(&self, address: &Address) -> Option<usize> {
        self.members.position(address)
    }

    /// Would adding this address succeed?
    pub fn check_add(&self, address: &Address) -> Result<(), WalletError> {
        if address.is_zero() {
            return Err(WalletError::ZeroAddress);
        }
        if self.members.contains(address) {
            return Err(WalletError::DuplicateSigner(*address));
        }
        Ok(())
    }

    /// Would removing this address succeed? Removal must leave at least
    /// `threshold` signers, or the threshold could never be reached again.
    pub fn check_remove(&self, address: &Address) -> Result<(), WalletError> {
        if !self.members.contains(address) {
            return Err(WalletError::UnknownSigner(*address));
        }
        if self.members.len() <= self.threshold {
            return Err(WalletError::ThresholdViolation {
                signers: self.members.len() - 1,
                threshold: self.threshold,
            });
        }
        Ok(())
    }

    /// Add a signer
    pub fn add(&mut self, address: Address) -> Result<(), WalletError> {
        self.check_add(&address)?;
        self.members.insert(address);
        Ok(())
    }

    /// Remove a signer (swap-with-last, order not preserved)
    pub fn remove(&mut self, address: &Address) -> Result<(), WalletError> {
        self.check_remove(address)?;
        self.members.remove(address);
        Ok(())
    }

    /// Rebuild the position map after deserialization
    pub fn rebuild(&mut self) {
        self.members.rebuild();
    }
}
