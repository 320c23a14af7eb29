//! Proposed transactions and their lifecycle
//!
//! A transaction's content fields are fixed at proposal time; only the
//! lifecycle state and the set of confirming signers mutate afterwards.
//! The digest over the content is what signers actually sign, bound to
//! this wallet instance through a domain separator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::{Address, AddressError, FieldHasher};

/// Domain separator name, fixed for the crate
pub const DOMAIN_NAME: &str = "quorum-wallet";
/// Domain separator version, bumped on digest-format changes
pub const DOMAIN_VERSION: &str = "1";

/// What a transaction does when it executes
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxKind {
    /// Transfer value and/or invoke the target with the payload
    Normal,
    /// Add the address encoded in the payload to the signer set
    AddSigner,
    /// Remove the address encoded in the payload from the signer set
    RemoveSigner,
}

impl TxKind {
    /// Stable one-byte tag fed into the digest
    pub fn tag(&self) -> u8 {
        match self {
            TxKind::Normal => 0,
            TxKind::AddSigner => 1,
            TxKind::RemoveSigner => 2,
        }
    }
}

/// Lifecycle state of a transaction.
///
/// `Pending` is the sole initial state; the other three are terminal.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum TxState {
    /// Awaiting confirmations
    Pending,
    /// Reached threshold and its effect was applied
    Executed,
    /// Reached threshold but the external call reported failure
    Failed,
    /// Cancelled by a signer before execution
    Cancelled,
}

impl TxState {
    /// True for the non-terminal state
    pub fn is_pending(&self) -> bool {
        matches!(self, TxState::Pending)
    }
}

/// Identity of one deployed wallet, mixed into every digest so a signature
/// for one wallet (or one network) can never authorize another.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Domain {
    /// Network identity
    pub chain_id: u64,
    /// The wallet's own address
    pub wallet: Address,
}

impl Domain {
    fn hash(&self) -> [u8; 32] {
        FieldHasher::new()
            .field(DOMAIN_NAME.as_bytes())
            .field(DOMAIN_VERSION.as_bytes())
            .fixed(&self.chain_id.to_be_bytes())
            .fixed(self.wallet.as_bytes())
            .finish()
    }
}

/// A proposed unit of work awaiting confirmations
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Transaction {
    /// Sequential id assigned at proposal
    pub id: u64,
    /// Call target (ignored for signer changes)
    pub target: Address,
    /// Value to transfer
    pub value: u64,
    /// Opaque call payload; for signer changes, the 20-byte subject address
    pub payload: Vec<u8>,
    /// Operation type
    pub kind: TxKind,
    /// Replay counter captured at proposal time
    pub nonce: u64,
    /// Lifecycle state
    pub state: TxState,
    /// Signers that have confirmed, in confirmation order
    pub confirmed_by: Vec<Address>,
    /// When the transaction was proposed
    pub submitted_at: DateTime<Utc>,
}

impl Transaction {
    /// Create a new pending transaction
    pub fn new(
        id: u64,
        target: Address,
        value: u64,
        payload: Vec<u8>,
        kind: TxKind,
        nonce: u64,
    ) -> Self {
        Self {
            id,
            target,
            value,
            payload,
            kind,
            nonce,
            state: TxState::Pending,
            confirmed_by: Vec::new(),
            submitted_at: Utc::now(),
        }
    }

    /// Domain-separated digest of the exact content fields.
    ///
    /// Pure and stable: repeated calls over the same fields yield the same
    /// 32 bytes, and an external signer can recompute it from the fields
    /// and domain parameters alone.
    pub fn digest(&self, domain: &Domain) -> [u8; 32] {
        FieldHasher::new()
            .fixed(&domain.hash())
            .fixed(self.target.as_bytes())
            .fixed(&self.value.to_be_bytes())
            .field(&self.payload)
            .fixed(&self.nonce.to_be_bytes())
            .fixed(&[self.kind.tag()])
            .finish()
    }

    /// Number of distinct signers that have confirmed
    pub fn confirmation_count(&self) -> usize {
        self.confirmed_by.len()
    }

    /// Whether a signer has already confirmed
    pub fn is_confirmed_by(&self, signer: &Address) -> bool {
        self.confirmed_by.contains(signer)
    }

    /// Decode the subject address of an AddSigner/RemoveSigner payload
    pub fn signer_payload(&self) -> Result<Address, AddressError> {
        Address::from_slice(&self.payload)
    }
}
