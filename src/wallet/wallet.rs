//! The multisig wallet aggregate
//!
//! One `Wallet` instance owns the signer registry, the append-only
//! transaction table, the pending index, the replay counter, and the event
//! log. All mutation goes through its methods; entry points run to
//! completion one at a time, so a rejection leaves no partial state behind.
//!
//! Confirmation and execution are a single atomic step: the confirmation
//! that reaches the threshold triggers execution before returning, and
//! there is no separate execute entry point.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{recover_signer, Address, FieldHasher};
use crate::wallet::events::WalletEvent;
use crate::wallet::host::CallHost;
use crate::wallet::index::IndexedSet;
use crate::wallet::registry::SignerRegistry;
use crate::wallet::transaction::{Domain, Transaction, TxKind, TxState};

/// Errors that reject a wallet call outright (no state change)
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WalletError {
    #[error("Signer list is empty")]
    EmptySigners,
    #[error("Invalid threshold {threshold} for {signers} signers")]
    InvalidThreshold { threshold: usize, signers: usize },
    #[error("Zero address is not a valid signer")]
    ZeroAddress,
    #[error("Duplicate signer: {0}")]
    DuplicateSigner(Address),
    #[error("Not an authorized signer: {0}")]
    NotSigner(Address),
    #[error("Unknown signer: {0}")]
    UnknownSigner(Address),
    #[error("Unknown transaction id: {0}")]
    UnknownTransaction(u64),
    #[error("Transaction {id} already confirmed by {signer}")]
    AlreadyConfirmed { id: u64, signer: Address },
    #[error("Transaction {id} is not pending (state: {state:?})")]
    NotPending { id: u64, state: TxState },
    #[error("Supplied digest does not match transaction {0}")]
    DigestMismatch(u64),
    #[error("Signature does not match the confirming signer")]
    InvalidSignature,
    #[error("Insufficient balance: have {have}, need {need}")]
    InsufficientBalance { have: u64, need: u64 },
    #[error("Malformed signer-change payload in transaction {0}")]
    InvalidPayload(u64),
    #[error("Removal would leave {signers} signers, below threshold {threshold}")]
    ThresholdViolation { signers: usize, threshold: usize },
}

/// A k-of-n threshold wallet
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Wallet {
    /// This wallet's own address, derived from the initial configuration
    address: Address,
    /// Network identity mixed into every digest
    chain_id: u64,
    /// Authorized signers and the confirmation threshold
    registry: SignerRegistry,
    /// Append-only transaction table; id == index
    transactions: Vec<Transaction>,
    /// Ids still awaiting execution
    pending: IndexedSet<u64>,
    /// Replay counter; advances only on successful execution
    nonce: u64,
    /// Value held by the wallet
    balance: u64,
    /// Append-only event log
    events: Vec<WalletEvent>,
}

impl Wallet {
    /// Create a wallet from its initial signer list and threshold.
    ///
    /// Rejects an empty list, duplicate or zero signers, and a threshold
    /// outside `[1, n]`. The wallet's address is derived from the sorted
    /// signer list, the threshold, and the chain id, so the same
    /// configuration always yields the same address.
    pub fn new(signers: &[Address], threshold: usize, chain_id: u64) -> Result<Self, WalletError> {
        let registry = SignerRegistry::new(signers, threshold)?;
        let address = Self::derive_address(signers, threshold, chain_id);

        log::info!(
            "Created {}-of-{} wallet {} on chain {}",
            threshold,
            signers.len(),
            address,
            chain_id
        );

        Ok(Self {
            address,
            chain_id,
            registry,
            transactions: Vec::new(),
            pending: IndexedSet::new(),
            nonce: 0,
            balance: 0,
            events: Vec::new(),
        })
    }

    /// Deterministic wallet address: RIPEMD160(SHA256(threshold || chain id
    /// || sorted signers))
    fn derive_address(signers: &[Address], threshold: usize, chain_id: u64) -> Address {
        let mut sorted: Vec<&Address> = signers.iter().collect();
        sorted.sort();

        let mut hasher = FieldHasher::new()
            .fixed(&(threshold as u64).to_be_bytes())
            .fixed(&chain_id.to_be_bytes());
        for signer in sorted {
            hasher = hasher.fixed(signer.as_bytes());
        }
        Address::from_config_hash(&hasher.finish())
    }

    // =========================================================================
    // Mutating entry points
    // =========================================================================

    /// Credit value to the wallet. No authorization; only records the event.
    pub fn deposit(&mut self, sender: Address, amount: u64) {
        self.balance += amount;
        self.events.push(WalletEvent::Deposit { sender, amount });
        log::debug!("Deposit of {} from {}", amount, sender);
    }

    /// Propose a transaction. Open to anyone, signer or not; the current
    /// replay counter is captured into the transaction at this point.
    /// Returns the new sequential id.
    pub fn propose(
        &mut self,
        sender: Address,
        target: Address,
        value: u64,
        payload: Vec<u8>,
        kind: TxKind,
    ) -> u64 {
        let id = self.transactions.len() as u64;
        self.transactions
            .push(Transaction::new(id, target, value, payload, kind, self.nonce));
        self.pending.insert(id);
        self.events
            .push(WalletEvent::TransactionSubmitted { id, sender });
        log::info!("Transaction {} submitted by {} ({:?})", id, sender, kind);
        id
    }

    /// Confirm a pending transaction with a signature over its digest.
    ///
    /// Checks, in order: the caller is a signer, has not confirmed this id
    /// before, the transaction is pending, the supplied digest matches the
    /// recomputed one, and the signature recovers to the caller. When the
    /// confirmation count reaches the threshold the transaction executes
    /// within this same call and the final state is returned; below the
    /// threshold `Pending` is returned.
    ///
    /// Registry-level or balance failures at the execution step reject the
    /// whole call (validated before the confirmation is recorded). A
    /// failure reported by the external call itself is not a rejection:
    /// the call succeeds and the transaction ends `Failed`.
    pub fn confirm(
        &mut self,
        caller: Address,
        id: u64,
        signature: &[u8],
        claimed_digest: &[u8; 32],
        host: &mut dyn CallHost,
    ) -> Result<TxState, WalletError> {
        if !self.registry.is_signer(&caller) {
            return Err(WalletError::NotSigner(caller));
        }
        let domain = self.domain();
        let tx = self
            .transactions
            .get(id as usize)
            .ok_or(WalletError::UnknownTransaction(id))?;
        if tx.is_confirmed_by(&caller) {
            return Err(WalletError::AlreadyConfirmed { id, signer: caller });
        }
        if !tx.state.is_pending() {
            return Err(WalletError::NotPending {
                id,
                state: tx.state,
            });
        }

        let digest = tx.digest(&domain);
        if digest != *claimed_digest {
            return Err(WalletError::DigestMismatch(id));
        }
        let recovered =
            recover_signer(&digest, signature).map_err(|_| WalletError::InvalidSignature)?;
        if recovered != caller {
            return Err(WalletError::InvalidSignature);
        }

        // Validate the execution effect before recording anything, so a
        // rejection at this tier leaves the call with no state change.
        let will_execute = tx.confirmation_count() + 1 >= self.registry.threshold();
        if will_execute {
            self.preflight(id)?;
        }

        let tx = &mut self.transactions[id as usize];
        tx.confirmed_by.push(caller);
        self.events
            .push(WalletEvent::TransactionConfirmed { id, signer: caller });
        log::info!(
            "Transaction {} confirmed by {} ({}/{})",
            id,
            caller,
            self.transactions[id as usize].confirmation_count(),
            self.registry.threshold()
        );

        if will_execute {
            self.execute(id, host)
        } else {
            Ok(TxState::Pending)
        }
    }

    /// Cancel a pending transaction. Any signer may cancel any pending
    /// transaction, regardless of who proposed it or how many
    /// confirmations it has.
    pub fn cancel(&mut self, caller: Address, id: u64) -> Result<(), WalletError> {
        if !self.registry.is_signer(&caller) {
            return Err(WalletError::NotSigner(caller));
        }
        let tx = self
            .transactions
            .get_mut(id as usize)
            .ok_or(WalletError::UnknownTransaction(id))?;
        if !tx.state.is_pending() {
            return Err(WalletError::NotPending {
                id,
                state: tx.state,
            });
        }

        tx.state = TxState::Cancelled;
        self.pending.remove(&id);
        self.events.push(WalletEvent::TransactionCancelled { id });
        log::info!("Transaction {} cancelled by {}", id, caller);
        Ok(())
    }

    // =========================================================================
    // Execution
    // =========================================================================

    /// Checks that must hold for execution to succeed, run before the
    /// confirming signature is recorded.
    fn preflight(&self, id: u64) -> Result<(), WalletError> {
        let tx = &self.transactions[id as usize];
        match tx.kind {
            TxKind::AddSigner => {
                let subject = tx
                    .signer_payload()
                    .map_err(|_| WalletError::InvalidPayload(id))?;
                self.registry.check_add(&subject)
            }
            TxKind::RemoveSigner => {
                let subject = tx
                    .signer_payload()
                    .map_err(|_| WalletError::InvalidPayload(id))?;
                self.registry.check_remove(&subject)
            }
            TxKind::Normal => {
                if tx.value > self.balance {
                    return Err(WalletError::InsufficientBalance {
                        have: self.balance,
                        need: tx.value,
                    });
                }
                Ok(())
            }
        }
    }

    /// Apply the transaction's effect exactly once. Invoked only from
    /// `confirm` after the threshold is met and `preflight` passed.
    fn execute(&mut self, id: u64, host: &mut dyn CallHost) -> Result<TxState, WalletError> {
        let tx = &self.transactions[id as usize];
        if !tx.state.is_pending() {
            return Ok(tx.state);
        }
        let (kind, target, value) = (tx.kind, tx.target, tx.value);

        let state = match kind {
            TxKind::AddSigner => {
                let subject = self.transactions[id as usize]
                    .signer_payload()
                    .map_err(|_| WalletError::InvalidPayload(id))?;
                self.registry.add(subject)?;
                self.events.push(WalletEvent::SignerAdded { signer: subject });
                log::info!("Signer {} added by transaction {}", subject, id);
                TxState::Executed
            }
            TxKind::RemoveSigner => {
                let subject = self.transactions[id as usize]
                    .signer_payload()
                    .map_err(|_| WalletError::InvalidPayload(id))?;
                self.registry.remove(&subject)?;
                self.events
                    .push(WalletEvent::SignerRemoved { signer: subject });
                log::info!("Signer {} removed by transaction {}", subject, id);
                TxState::Executed
            }
            TxKind::Normal => {
                let payload = self.transactions[id as usize].payload.clone();
                if host.call(target, value, &payload) {
                    self.balance -= value;
                    TxState::Executed
                } else {
                    // Captured outcome: the callee rejected the call. The
                    // confirming call still succeeds; only the transaction's
                    // terminal state reflects the failure.
                    log::warn!("External call for transaction {} failed", id);
                    TxState::Failed
                }
            }
        };

        self.transactions[id as usize].state = state;
        self.pending.remove(&id);
        if state == TxState::Executed {
            self.nonce += 1;
        }
        self.events.push(WalletEvent::ExecutedTransaction { id, state });
        log::info!("Transaction {} finished: {:?}", id, state);
        Ok(state)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// This wallet's own address
    pub fn address(&self) -> Address {
        self.address
    }

    /// The digest domain of this wallet instance
    pub fn domain(&self) -> Domain {
        Domain {
            chain_id: self.chain_id,
            wallet: self.address,
        }
    }

    /// Current signers, in registry order
    pub fn signers(&self) -> &[Address] {
        self.registry.signers()
    }

    /// Number of signers (n)
    pub fn signer_count(&self) -> usize {
        self.registry.len()
    }

    /// Confirmation threshold (k)
    pub fn threshold(&self) -> usize {
        self.registry.threshold()
    }

    /// Whether an address may confirm
    pub fn is_signer(&self, address: &Address) -> bool {
        self.registry.is_signer(address)
    }

    /// Value currently held
    pub fn balance(&self) -> u64 {
        self.balance
    }

    /// The replay counter. Captured into each transaction at proposal
    /// time; a later advance does not invalidate an already-proposed
    /// transaction's digest or signatures.
    pub fn nonce(&self) -> u64 {
        self.nonce
    }

    /// Full record for a transaction id
    pub fn transaction(&self, id: u64) -> Option<&Transaction> {
        self.transactions.get(id as usize)
    }

    /// Total number of transactions ever proposed
    pub fn transaction_count(&self) -> usize {
        self.transactions.len()
    }

    /// Ids still awaiting execution (unspecified order)
    pub fn pending_ids(&self) -> &[u64] {
        self.pending.as_slice()
    }

    /// The digest a signer must sign for this transaction, as stored on
    /// the ledger side. Stable across repeated calls.
    pub fn digest_of(&self, id: u64) -> Option<[u8; 32]> {
        let domain = self.domain();
        self.transactions.get(id as usize).map(|tx| tx.digest(&domain))
    }

    /// Whether a signer has confirmed a transaction
    pub fn is_confirmed_by(&self, id: u64, signer: &Address) -> bool {
        self.transactions
            .get(id as usize)
            .map(|tx| tx.is_confirmed_by(signer))
            .unwrap_or(false)
    }

    /// The append-only event log
    pub fn events(&self) -> &[WalletEvent] {
        &self.events
    }

    /// Rebuild non-serialized lookup structures after deserialization
    pub fn rebuild_indices(&mut self) {
        self.registry.rebuild();
        self.pending.rebuild();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::KeyPair;
    use crate::wallet::host::AccountBook;

    fn setup(n: usize, threshold: usize) -> (Wallet, Vec<KeyPair>) {
        let keys: Vec<KeyPair> = (0..n).map(|_| KeyPair::generate()).collect();
        let signers: Vec<Address> = keys.iter().map(|k| k.address()).collect();
        let wallet = Wallet::new(&signers, threshold, 1).unwrap();
        (wallet, keys)
    }

    fn confirm_with(
        wallet: &mut Wallet,
        key: &KeyPair,
        id: u64,
        host: &mut AccountBook,
    ) -> Result<TxState, WalletError> {
        let digest = wallet.digest_of(id).unwrap();
        let signature = key.sign(&digest).unwrap();
        wallet.confirm(key.address(), id, &signature, &digest, host)
    }

    #[test]
    fn test_construction_validation() {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let signers: Vec<Address> = keys.iter().map(|k| k.address()).collect();

        assert!(matches!(
            Wallet::new(&[], 1, 1),
            Err(WalletError::EmptySigners)
        ));
        assert!(matches!(
            Wallet::new(&signers, 0, 1),
            Err(WalletError::InvalidThreshold { .. })
        ));
        assert!(matches!(
            Wallet::new(&signers, 4, 1),
            Err(WalletError::InvalidThreshold { .. })
        ));

        let mut with_dup = signers.clone();
        with_dup.push(signers[0]);
        assert!(matches!(
            Wallet::new(&with_dup, 2, 1),
            Err(WalletError::DuplicateSigner(_))
        ));

        let mut with_zero = signers.clone();
        with_zero.push(Address::ZERO);
        assert!(matches!(
            Wallet::new(&with_zero, 2, 1),
            Err(WalletError::ZeroAddress)
        ));
    }

    #[test]
    fn test_address_deterministic_and_order_independent() {
        let keys: Vec<KeyPair> = (0..3).map(|_| KeyPair::generate()).collect();
        let signers: Vec<Address> = keys.iter().map(|k| k.address()).collect();
        let mut reversed = signers.clone();
        reversed.reverse();

        let a = Wallet::new(&signers, 2, 1).unwrap();
        let b = Wallet::new(&reversed, 2, 1).unwrap();
        assert_eq!(a.address(), b.address());

        // Different threshold or chain yields a different identity
        let c = Wallet::new(&signers, 3, 1).unwrap();
        let d = Wallet::new(&signers, 2, 2).unwrap();
        assert_ne!(c.address(), a.address());
        assert_ne!(d.address(), a.address());
    }

    #[test]
    fn test_scenario_a_transfer_executes_at_threshold() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        let recipient = KeyPair::generate().address();

        wallet.deposit(KeyPair::generate().address(), 100);
        let id = wallet.propose(keys[0].address(), recipient, 10, vec![], TxKind::Normal);
        assert_eq!(wallet.pending_ids(), &[id]);

        let state = confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        assert_eq!(state, TxState::Pending);
        assert_eq!(wallet.transaction(id).unwrap().confirmation_count(), 1);

        let state = confirm_with(&mut wallet, &keys[1], id, &mut host).unwrap();
        assert_eq!(state, TxState::Executed);
        assert_eq!(wallet.transaction(id).unwrap().state, TxState::Executed);
        assert_eq!(host.balance_of(&recipient), 10);
        assert_eq!(wallet.balance(), 90);
        assert!(wallet.pending_ids().is_empty());
        assert_eq!(wallet.nonce(), 1);
    }

    #[test]
    fn test_scenario_b_wrong_signature_and_wrong_digest() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        wallet.deposit(keys[0].address(), 100);
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            10,
            vec![],
            TxKind::Normal,
        );

        // Signature over a different message: digest check passes, but the
        // recovered signer does not match the caller.
        let digest = wallet.digest_of(id).unwrap();
        let other = crate::crypto::sha256(b"some other message");
        let signature = keys[0].sign(&other).unwrap();
        let result = wallet.confirm(keys[0].address(), id, &signature, &digest, &mut host);
        assert_eq!(result, Err(WalletError::InvalidSignature));

        // Claimed digest computed against different parameters
        let signature = keys[0].sign(&other).unwrap();
        let result = wallet.confirm(keys[0].address(), id, &signature, &other, &mut host);
        assert_eq!(result, Err(WalletError::DigestMismatch(id)));

        let tx = wallet.transaction(id).unwrap();
        assert_eq!(tx.state, TxState::Pending);
        assert_eq!(tx.confirmation_count(), 0);
    }

    #[test]
    fn test_scenario_c_cancel_then_confirm_rejected() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            5,
            vec![],
            TxKind::Normal,
        );

        wallet.cancel(keys[1].address(), id).unwrap();
        assert_eq!(wallet.transaction(id).unwrap().state, TxState::Cancelled);
        assert!(wallet.pending_ids().is_empty());

        let result = confirm_with(&mut wallet, &keys[0], id, &mut host);
        assert_eq!(
            result,
            Err(WalletError::NotPending {
                id,
                state: TxState::Cancelled
            })
        );

        // A second cancel is rejected the same way
        assert!(matches!(
            wallet.cancel(keys[0].address(), id),
            Err(WalletError::NotPending { .. })
        ));
    }

    #[test]
    fn test_cancel_requires_signer() {
        let (mut wallet, keys) = setup(3, 2);
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            5,
            vec![],
            TxKind::Normal,
        );
        let stranger = KeyPair::generate().address();
        assert!(matches!(
            wallet.cancel(stranger, id),
            Err(WalletError::NotSigner(_))
        ));
    }

    #[test]
    fn test_scenario_d_add_signer() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        let newcomer = KeyPair::generate().address();

        let id = wallet.propose(
            keys[0].address(),
            wallet.address(),
            0,
            newcomer.as_bytes().to_vec(),
            TxKind::AddSigner,
        );
        confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        let state = confirm_with(&mut wallet, &keys[1], id, &mut host).unwrap();

        assert_eq!(state, TxState::Executed);
        assert_eq!(wallet.signer_count(), 4);
        assert!(wallet.is_signer(&newcomer));
        assert_eq!(wallet.nonce(), 1);
        assert!(wallet
            .events()
            .contains(&WalletEvent::SignerAdded { signer: newcomer }));
    }

    #[test]
    fn test_scenario_e_remove_signer_threshold_boundary() {
        // 3 signers, threshold 2: len == threshold + 1, removal succeeds
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();

        let id = wallet.propose(
            keys[0].address(),
            wallet.address(),
            0,
            keys[2].address().as_bytes().to_vec(),
            TxKind::RemoveSigner,
        );
        confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        let state = confirm_with(&mut wallet, &keys[1], id, &mut host).unwrap();
        assert_eq!(state, TxState::Executed);
        assert_eq!(wallet.signer_count(), 2);
        assert!(!wallet.is_signer(&keys[2].address()));

        // Now len == threshold: the removal is rejected at the confirming
        // call that would trigger execution, with no confirmation recorded.
        let id = wallet.propose(
            keys[0].address(),
            wallet.address(),
            0,
            keys[1].address().as_bytes().to_vec(),
            TxKind::RemoveSigner,
        );
        confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        let result = confirm_with(&mut wallet, &keys[1], id, &mut host);
        assert!(matches!(
            result,
            Err(WalletError::ThresholdViolation { .. })
        ));

        let tx = wallet.transaction(id).unwrap();
        assert_eq!(tx.state, TxState::Pending);
        assert_eq!(tx.confirmation_count(), 1);
        assert_eq!(wallet.signer_count(), 2);
        assert_eq!(wallet.pending_ids(), &[id]);
    }

    #[test]
    fn test_double_confirmation_rejected() {
        let (mut wallet, keys) = setup(3, 3);
        let mut host = AccountBook::new();
        wallet.deposit(keys[0].address(), 50);
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            5,
            vec![],
            TxKind::Normal,
        );

        confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        assert!(wallet.is_confirmed_by(id, &keys[0].address()));
        assert!(!wallet.is_confirmed_by(id, &keys[1].address()));

        let result = confirm_with(&mut wallet, &keys[0], id, &mut host);
        assert_eq!(
            result,
            Err(WalletError::AlreadyConfirmed {
                id,
                signer: keys[0].address()
            })
        );
        assert_eq!(wallet.transaction(id).unwrap().confirmation_count(), 1);
    }

    #[test]
    fn test_non_signer_cannot_confirm() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            0,
            vec![],
            TxKind::Normal,
        );

        let stranger = KeyPair::generate();
        let result = confirm_with(&mut wallet, &stranger, id, &mut host);
        assert_eq!(result, Err(WalletError::NotSigner(stranger.address())));
        assert_eq!(wallet.transaction(id).unwrap().confirmation_count(), 0);
    }

    #[test]
    fn test_proposal_open_to_non_signers() {
        let (mut wallet, _) = setup(3, 2);
        let outsider = KeyPair::generate().address();
        let id = wallet.propose(outsider, KeyPair::generate().address(), 0, vec![], TxKind::Normal);
        assert_eq!(id, 0);
        assert!(wallet
            .events()
            .contains(&WalletEvent::TransactionSubmitted { id, sender: outsider }));
    }

    #[test]
    fn test_failed_external_call_is_captured() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        let recipient = KeyPair::generate().address();
        host.mark_failing(recipient);

        wallet.deposit(keys[0].address(), 100);
        let id = wallet.propose(keys[0].address(), recipient, 10, vec![], TxKind::Normal);

        confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        // The confirming call itself succeeds; the outcome is Failed
        let state = confirm_with(&mut wallet, &keys[1], id, &mut host).unwrap();
        assert_eq!(state, TxState::Failed);

        let tx = wallet.transaction(id).unwrap();
        assert_eq!(tx.state, TxState::Failed);
        // The confirmation that triggered execution is still recorded
        assert_eq!(tx.confirmation_count(), 2);
        // No balance movement, no replay-counter progression
        assert_eq!(wallet.balance(), 100);
        assert_eq!(host.balance_of(&recipient), 0);
        assert_eq!(wallet.nonce(), 0);
        assert!(wallet.pending_ids().is_empty());
        assert!(wallet
            .events()
            .contains(&WalletEvent::ExecutedTransaction {
                id,
                state: TxState::Failed
            }));
    }

    #[test]
    fn test_insufficient_balance_rejects_confirming_call() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        wallet.deposit(keys[0].address(), 5);
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            10,
            vec![],
            TxKind::Normal,
        );

        confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        let result = confirm_with(&mut wallet, &keys[1], id, &mut host);
        assert_eq!(
            result,
            Err(WalletError::InsufficientBalance { have: 5, need: 10 })
        );

        // All-or-nothing: the rejected call recorded nothing
        let tx = wallet.transaction(id).unwrap();
        assert_eq!(tx.state, TxState::Pending);
        assert_eq!(tx.confirmation_count(), 1);
        assert_eq!(wallet.pending_ids(), &[id]);

        // Top up and the same transaction executes
        wallet.deposit(keys[0].address(), 10);
        let state = confirm_with(&mut wallet, &keys[1], id, &mut host).unwrap();
        assert_eq!(state, TxState::Executed);
        assert_eq!(wallet.balance(), 5);
    }

    #[test]
    fn test_malformed_signer_payload_rejected_at_execution() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        let id = wallet.propose(
            keys[0].address(),
            wallet.address(),
            0,
            vec![1, 2, 3],
            TxKind::AddSigner,
        );

        confirm_with(&mut wallet, &keys[0], id, &mut host).unwrap();
        let result = confirm_with(&mut wallet, &keys[1], id, &mut host);
        assert_eq!(result, Err(WalletError::InvalidPayload(id)));
        assert_eq!(wallet.transaction(id).unwrap().confirmation_count(), 1);
        assert_eq!(wallet.signer_count(), 3);
    }

    #[test]
    fn test_unknown_transaction() {
        let (mut wallet, keys) = setup(2, 1);
        let mut host = AccountBook::new();
        let digest = [0u8; 32];
        let result = wallet.confirm(keys[0].address(), 42, &[0u8; 65], &digest, &mut host);
        assert_eq!(result, Err(WalletError::UnknownTransaction(42)));
        assert!(matches!(
            wallet.cancel(keys[0].address(), 42),
            Err(WalletError::UnknownTransaction(42))
        ));
    }

    #[test]
    fn test_pending_index_mirrors_pending_states() {
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        wallet.deposit(keys[0].address(), 100);

        let recipient = KeyPair::generate().address();
        let ids: Vec<u64> = (0..5)
            .map(|_| wallet.propose(keys[0].address(), recipient, 1, vec![], TxKind::Normal))
            .collect();

        // Execute id 1, cancel id 3
        confirm_with(&mut wallet, &keys[0], ids[1], &mut host).unwrap();
        confirm_with(&mut wallet, &keys[1], ids[1], &mut host).unwrap();
        wallet.cancel(keys[2].address(), ids[3]).unwrap();

        let mut pending: Vec<u64> = wallet.pending_ids().to_vec();
        pending.sort_unstable();
        assert_eq!(pending, vec![ids[0], ids[2], ids[4]]);

        // Exactly the ids whose state is Pending, no duplicates
        for id in 0..wallet.transaction_count() as u64 {
            let is_pending = wallet.transaction(id).unwrap().state.is_pending();
            assert_eq!(wallet.pending_ids().contains(&id), is_pending);
        }
    }

    #[test]
    fn test_nonce_advance_leaves_existing_digest_fixed() {
        // The replay counter is bound at proposal time. Executing another
        // transaction in between does not invalidate a previously proposed
        // transaction's digest or its already-collected signatures.
        let (mut wallet, keys) = setup(3, 2);
        let mut host = AccountBook::new();
        wallet.deposit(keys[0].address(), 100);
        let recipient = KeyPair::generate().address();

        let stale = wallet.propose(keys[0].address(), recipient, 10, vec![], TxKind::Normal);
        let stale_digest = wallet.digest_of(stale).unwrap();
        let stale_sig = keys[0].sign(&stale_digest).unwrap();

        // Execute an unrelated transaction; the global counter advances
        let other = wallet.propose(keys[0].address(), recipient, 1, vec![], TxKind::Normal);
        confirm_with(&mut wallet, &keys[0], other, &mut host).unwrap();
        confirm_with(&mut wallet, &keys[1], other, &mut host).unwrap();
        assert_eq!(wallet.nonce(), 1);

        // The stale proposal's digest is unchanged and its signature valid
        assert_eq!(wallet.digest_of(stale).unwrap(), stale_digest);
        let state = wallet
            .confirm(keys[0].address(), stale, &stale_sig, &stale_digest, &mut host)
            .unwrap();
        assert_eq!(state, TxState::Pending);

        // A NEW proposal picks up the advanced counter and gets a
        // different digest for otherwise identical fields
        let fresh = wallet.propose(keys[0].address(), recipient, 10, vec![], TxKind::Normal);
        assert_ne!(wallet.digest_of(fresh).unwrap(), stale_digest);
    }

    #[test]
    fn test_confirmations_monotone_until_terminal() {
        let (mut wallet, keys) = setup(4, 3);
        let mut host = AccountBook::new();
        wallet.deposit(keys[0].address(), 10);
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            1,
            vec![],
            TxKind::Normal,
        );

        let mut last = 0;
        for key in &keys[..3] {
            confirm_with(&mut wallet, key, id, &mut host).unwrap();
            let count = wallet.transaction(id).unwrap().confirmation_count();
            assert!(count > last);
            last = count;
        }
        assert_eq!(last, 3);
        assert_eq!(wallet.transaction(id).unwrap().state, TxState::Executed);

        // Terminal: no further confirmation is possible
        let result = confirm_with(&mut wallet, &keys[3], id, &mut host);
        assert!(matches!(result, Err(WalletError::NotPending { .. })));
    }

    #[test]
    fn test_never_executes_below_threshold() {
        let (mut wallet, keys) = setup(3, 3);
        let mut host = AccountBook::new();
        wallet.deposit(keys[0].address(), 10);
        let id = wallet.propose(
            keys[0].address(),
            KeyPair::generate().address(),
            1,
            vec![],
            TxKind::Normal,
        );

        for key in &keys[..2] {
            let state = confirm_with(&mut wallet, key, id, &mut host).unwrap();
            assert_eq!(state, TxState::Pending);
        }
        assert_eq!(wallet.transaction(id).unwrap().state, TxState::Pending);
    }

    #[test]
    fn test_deposit_records_event() {
        let (mut wallet, keys) = setup(2, 1);
        wallet.deposit(keys[0].address(), 42);
        assert_eq!(wallet.balance(), 42);
        assert_eq!(
            wallet.events(),
            &[WalletEvent::Deposit {
                sender: keys[0].address(),
                amount: 42
            }]
        );
    }

    #[test]
    fn test_digest_matches_independent_computation() {
        let (mut wallet, keys) = setup(2, 2);
        let recipient = KeyPair::generate().address();
        let id = wallet.propose(keys[0].address(), recipient, 7, vec![9, 9], TxKind::Normal);

        // An external signer recomputes from the fields and domain alone
        let reconstructed = Transaction::new(id, recipient, 7, vec![9, 9], TxKind::Normal, 0);
        assert_eq!(
            reconstructed.digest(&wallet.domain()),
            wallet.digest_of(id).unwrap()
        );
    }
}
