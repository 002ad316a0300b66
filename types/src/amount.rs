//! Governance token amounts.
//!
//! Balances and voting weights are fixed-point integers (u128) in raw units.
//! Tallies only ever grow, so the type exposes checked addition and no subtraction.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A quantity of the governance token: a holder's balance or a frozen vote weight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenAmount(u128);

impl TokenAmount {
    pub const ZERO: Self = Self(0);

    pub fn new(raw: u128) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u128 {
        self.0
    }

    /// Strictly positive balance: the eligibility rule for acting on the engine.
    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }
}

impl fmt::Display for TokenAmount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
