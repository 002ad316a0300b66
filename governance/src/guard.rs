//! Access guard: only current token holders may act.

use tally_store::BalanceOracle;
use tally_types::{Address, TokenAmount};
use tracing::debug;

use crate::error::GovernanceError;

/// Precondition shared by every mutating operation and by settlement.
pub struct AccessGuard;

impl AccessGuard {
    /// Require a strictly positive balance for `principal` and return it.
    ///
    /// The returned amount is the one read during this call; the voting engine
    /// freezes exactly this value as the voter's weight.
    pub fn require_holder<O: BalanceOracle + ?Sized>(
        oracle: &O,
        principal: &Address,
    ) -> Result<TokenAmount, GovernanceError> {
        let balance = oracle.balance_of(principal);
        if !balance.is_positive() {
            debug!(principal = %principal, "rejected: no governance token balance");
            return Err(GovernanceError::NotEligible(principal.to_string()));
        }
        Ok(balance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use std::collections::HashMap;

    struct Balances(HashMap<Address, TokenAmount>);

    impl BalanceOracle for Balances {
        fn balance_of(&self, holder: &Address) -> TokenAmount {
            self.0.get(holder).copied().unwrap_or(TokenAmount::ZERO)
        }
    }

    #[test]
    fn positive_balance_passes() {
        let oracle = Balances(HashMap::from([(Address::new("alice"), TokenAmount::new(3))]));
        let balance = AccessGuard::require_holder(&oracle, &Address::new("alice")).unwrap();
        assert_eq!(balance, TokenAmount::new(3));
    }

    #[test]
    fn zero_or_unknown_balance_is_rejected() {
        let oracle = Balances(HashMap::from([(Address::new("bob"), TokenAmount::ZERO)]));
        for who in ["bob", "nobody"] {
            let err = AccessGuard::require_holder(&oracle, &Address::new(who)).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Authorization);
        }
    }
}
