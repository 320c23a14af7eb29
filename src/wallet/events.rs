//! Observable wallet events
//!
//! Every state transition appends one event to the wallet's log, so
//! external collaborators can reconstruct the full history without
//! reaching into internal state.

use serde::{Deserialize, Serialize};

use crate::crypto::Address;
use crate::wallet::transaction::TxState;

/// An entry in the wallet's append-only event log
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum WalletEvent {
    /// Value was credited to the wallet
    Deposit { sender: Address, amount: u64 },
    /// A transaction was proposed
    TransactionSubmitted { id: u64, sender: Address },
    /// A signer confirmed a transaction
    TransactionConfirmed { id: u64, signer: Address },
    /// A transaction reached threshold and finished in `state`
    ExecutedTransaction { id: u64, state: TxState },
    /// A signer cancelled a pending transaction
    TransactionCancelled { id: u64 },
    /// An AddSigner transaction extended the signer set
    SignerAdded { signer: Address },
    /// A RemoveSigner transaction shrank the signer set
    SignerRemoved { signer: Address },
}
