//! Token-weighted governance for Tally.
//!
//! Holders of the governance token create proposals, cast weighted votes while
//! a proposal's window is open, and anyone holding tokens can settle it once
//! the window closes.
//!
//! Key rules:
//! - one vote per holder per proposal; the voter's weight is their balance at
//!   the moment of that vote and never changes afterwards;
//! - participation minimums are checked before the majority, so a thinly
//!   attended proposal never passes;
//! - settlement is a pure read of the tallies and can be repeated.

pub mod engine;
pub mod error;
pub mod event;
pub mod guard;
pub mod params;
pub mod persist;
pub mod proposal;
pub mod registry;
pub mod settlement;
pub mod voting;

pub use engine::GovernanceEngine;
pub use error::{ErrorKind, GovernanceError};
pub use event::{EventBus, GovernanceEvent};
pub use guard::AccessGuard;
pub use params::ProposalParams;
pub use proposal::{Proposal, ProposalStatus, Tally, VoteRecord};
pub use registry::ProposalRegistry;
pub use settlement::{Settlement, SettlementEngine};
pub use voting::VotingEngine;
