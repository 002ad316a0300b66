//! Nullable infrastructure for deterministic testing.
//!
//! Everything the governance core treats as external (the clock, the token
//! ledger, the proposal store) is abstracted behind a trait. This crate
//! provides test-friendly implementations that:
//! - Return deterministic values
//! - Can be controlled programmatically
//! - Never touch the filesystem or network
//!
//! Usage: swap real implementations for nullables in tests.

pub mod balances;
pub mod clock;
pub mod store;

pub use balances::NullBalances;
pub use clock::NullClock;
pub use store::NullGovernanceStore;
