//! Tally node: hosts the governance engine.
//!
//! The node is the coordinator that:
//! - Loads configuration from TOML
//! - Serves token balances from a ledger
//! - Keeps proposals in an LMDB store shared safely between hosts
//! - Reads the clock and persists every mutation before reporting success

pub mod balances;
pub mod config;
pub mod error;
pub mod node;

pub use balances::LedgerBalances;
pub use config::NodeConfig;
pub use error::NodeError;
pub use node::GovernanceNode;
