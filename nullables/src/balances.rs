//! Nullable balance oracle: a token ledger you can edit mid-test.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use tally_store::BalanceOracle;
use tally_types::{Address, TokenAmount};

/// An in-memory balance oracle for testing.
///
/// Thread-safe, so a test can keep an `Arc` to it while an engine owns another
/// and change balances between operations. Every lookup is counted.
#[derive(Default)]
pub struct NullBalances {
    balances: Mutex<HashMap<Address, TokenAmount>>,
    reads: AtomicUsize,
}

impl NullBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(address, raw balance)` pairs.
    pub fn with_balances<'a>(entries: impl IntoIterator<Item = (&'a str, u128)>) -> Self {
        let oracle = Self::new();
        for (holder, raw) in entries {
            oracle.set(holder, raw);
        }
        oracle
    }

    /// Set a holder's balance.
    pub fn set(&self, holder: &str, raw: u128) {
        self.balances
            .lock()
            .unwrap()
            .insert(Address::new(holder), TokenAmount::new(raw));
    }

    /// Drop a holder's balance to zero.
    pub fn clear(&self, holder: &str) {
        self.balances.lock().unwrap().remove(&Address::new(holder));
    }

    /// Number of `balance_of` calls served so far.
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl BalanceOracle for NullBalances {
    fn balance_of(&self, holder: &Address) -> TokenAmount {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.balances
            .lock()
            .unwrap()
            .get(holder)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }
}
