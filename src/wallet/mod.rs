//! Threshold-gated authorization engine
//!
//! A k-of-n signer set collectively controls a shared account: anyone may
//! propose a transaction, and it executes once `threshold` distinct
//! signers have produced valid signatures over its exact digest.
//!
//! # Example
//!
//! ```ignore
//! use quorum_wallet::wallet::{Wallet, TxKind, AccountBook};
//!
//! // Create a 2-of-3 wallet
//! let mut wallet = Wallet::new(&signers, 2, chain_id)?;
//! let mut host = AccountBook::new();
//!
//! // Propose a transfer and collect confirmations
//! let id = wallet.propose(sender, recipient, 10, vec![], TxKind::Normal);
//! let digest = wallet.digest_of(id).unwrap();
//! wallet.confirm(signer1, id, &sig1, &digest, &mut host)?;
//! wallet.confirm(signer2, id, &sig2, &digest, &mut host)?;
//! // The second confirmation reached the threshold and executed the
//! // transaction within the same call.
//! ```

pub mod events;
pub mod host;
pub mod index;
pub mod registry;
pub mod transaction;
pub mod wallet;

pub use events::WalletEvent;
pub use host::{AccountBook, CallHost};
pub use index::IndexedSet;
pub use registry::SignerRegistry;
pub use transaction::{Domain, Transaction, TxKind, TxState, DOMAIN_NAME, DOMAIN_VERSION};
pub use wallet::{Wallet, WalletError};
