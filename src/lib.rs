//! Quorum-Wallet: a threshold-gated multisig authorization engine
//!
//! A set of designated signers collectively controls a shared account.
//! Anyone may propose a transaction (a value transfer, an arbitrary call,
//! or a change to the signer set itself); it executes only once at least
//! `threshold` of the registered signers have produced valid signatures
//! over its exact digest. This crate provides:
//! - A k-of-n signer registry with O(1) membership and removal
//! - Domain-separated transaction digests bound to one wallet instance
//! - Recoverable ECDSA signatures (secp256k1), verified by recovering the
//!   signer identity from the signature itself
//! - Atomic confirm-then-execute semantics with a pending-transaction
//!   index and an append-only event log
//! - JSON persistence of wallet snapshots
//!
//! # Example
//!
//! ```rust
//! use quorum_wallet::crypto::KeyPair;
//! use quorum_wallet::wallet::{AccountBook, TxKind, TxState, Wallet};
//!
//! let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
//! let signers: Vec<_> = keys.iter().map(|k| k.address()).collect();
//!
//! // A 2-of-3 wallet holding 100 value units
//! let mut wallet = Wallet::new(&signers, 2, 1).unwrap();
//! let mut host = AccountBook::new();
//! wallet.deposit(signers[0], 100);
//!
//! // Propose a transfer, then confirm with two distinct signers
//! let recipient = KeyPair::generate().address();
//! let id = wallet.propose(signers[0], recipient, 10, vec![], TxKind::Normal);
//! let digest = wallet.digest_of(id).unwrap();
//!
//! let sig = keys[0].sign(&digest).unwrap();
//! assert_eq!(
//!     wallet.confirm(signers[0], id, &sig, &digest, &mut host).unwrap(),
//!     TxState::Pending
//! );
//! let sig = keys[1].sign(&digest).unwrap();
//! assert_eq!(
//!     wallet.confirm(signers[1], id, &sig, &digest, &mut host).unwrap(),
//!     TxState::Executed
//! );
//! assert_eq!(host.balance_of(&recipient), 10);
//! ```

pub mod crypto;
pub mod storage;
pub mod wallet;

// Re-export commonly used types
pub use crypto::{Address, KeyPair};
pub use storage::{Storage, StorageConfig, StorageError};
pub use wallet::{
    AccountBook, CallHost, Domain, Transaction, TxKind, TxState, Wallet, WalletError, WalletEvent,
};
