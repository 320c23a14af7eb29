//! External call host
//!
//! The wallet never talks to the outside world directly; executing a
//! `Normal` transaction goes through [`CallHost`]. The host reports
//! failure through its return value, never by unwinding the caller, which
//! is what lets a failed payee-side call leave the confirming signer's
//! own state changes intact.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::crypto::Address;

/// The seam between the wallet and whatever receives its calls.
///
/// `call` must return `true` if the target accepted the invocation and
/// `false` otherwise; it must not panic for any input.
pub trait CallHost {
    /// Invoke `target` with `value` and `payload`
    fn call(&mut self, target: Address, value: u64, payload: &[u8]) -> bool;
}

/// In-memory account book: credits targets on call, with a mark-failing
/// set to simulate callees that reject the invocation.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct AccountBook {
    /// Balances by address
    balances: HashMap<Address, u64>,
    /// Targets whose calls fail
    failing: HashSet<Address>,
}

impl AccountBook {
    /// Create an empty account book
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the balance of an address
    pub fn balance_of(&self, address: &Address) -> u64 {
        *self.balances.get(address).unwrap_or(&0)
    }

    /// Credit an address directly
    pub fn credit(&mut self, address: Address, amount: u64) {
        *self.balances.entry(address).or_insert(0) += amount;
    }

    /// Make every call to this target fail
    pub fn mark_failing(&mut self, address: Address) {
        self.failing.insert(address);
    }

    /// Calls to this target succeed again
    pub fn clear_failing(&mut self, address: &Address) {
        self.failing.remove(address);
    }
}

impl CallHost for AccountBook {
    fn call(&mut self, target: Address, value: u64, _payload: &[u8]) -> bool {
        if self.failing.contains(&target) {
            return false;
        }
        self.credit(target, value);
        true
    }
}
