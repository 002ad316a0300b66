//! Config-backed balance oracle.

use std::collections::HashMap;

use tally_store::BalanceOracle;
use tally_types::{Address, TokenAmount};

use crate::NodeConfig;

/// A fixed token ledger, read from the node configuration.
#[derive(Clone, Debug, Default)]
pub struct LedgerBalances {
    balances: HashMap<Address, TokenAmount>,
}

impl LedgerBalances {
    pub fn from_config(config: &NodeConfig) -> Self {
        config
            .balances
            .iter()
            .map(|(holder, raw)| (Address::new(holder.as_str()), u128::from(*raw)))
            .collect()
    }

    pub fn holder_count(&self) -> usize {
        self.balances.len()
    }
}

impl FromIterator<(Address, u128)> for LedgerBalances {
    fn from_iter<I: IntoIterator<Item = (Address, u128)>>(iter: I) -> Self {
        Self {
            balances: iter
                .into_iter()
                .map(|(holder, raw)| (holder, TokenAmount::new(raw)))
                .collect(),
        }
    }
}

impl BalanceOracle for LedgerBalances {
    fn balance_of(&self, holder: &Address) -> TokenAmount {
        self.balances
            .get(holder)
            .copied()
            .unwrap_or(TokenAmount::ZERO)
    }
}
