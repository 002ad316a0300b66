//! Balance oracle: read-only view of the governance token ledger.

use std::sync::Arc;

use tally_types::{Address, TokenAmount};

/// Source of a holder's current credential balance.
///
/// Implementations answer with the balance as of the moment of the call; an
/// unknown holder has a zero balance.
pub trait BalanceOracle {
    fn balance_of(&self, holder: &Address) -> TokenAmount;
}

impl<O: BalanceOracle + ?Sized> BalanceOracle for &O {
    fn balance_of(&self, holder: &Address) -> TokenAmount {
        (**self).balance_of(holder)
    }
}

impl<O: BalanceOracle + ?Sized> BalanceOracle for Arc<O> {
    fn balance_of(&self, holder: &Address) -> TokenAmount {
        (**self).balance_of(holder)
    }
}

impl<O: BalanceOracle + ?Sized> BalanceOracle for Box<O> {
    fn balance_of(&self, holder: &Address) -> TokenAmount {
        (**self).balance_of(holder)
    }
}
