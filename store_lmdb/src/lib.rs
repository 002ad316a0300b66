//! LMDB storage backend for Tally.
//!
//! Implements the `tally-store` governance trait using the `heed` LMDB
//! bindings. All databases live in a single environment, so one write
//! transaction covers a proposal record, its index entry and the registry
//! metadata.

pub mod environment;
pub mod error;
pub mod governance;

pub use environment::LmdbEnvironment;
pub use error::LmdbError;
pub use governance::LmdbGovernanceStore;
