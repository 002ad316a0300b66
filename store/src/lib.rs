//! Abstract collaborator traits for the Tally governance engine.
//!
//! The core never talks to a concrete ledger or database. Balance lookups go
//! through [`BalanceOracle`] and persistence through [`GovernanceStore`]; hosts
//! and tests plug in their own implementations.

pub mod balance;
pub mod error;
pub mod governance;

pub use balance::BalanceOracle;
pub use error::StoreError;
pub use governance::{GovernanceBatch, GovernanceStore};
