//! Fundamental types for the Tally governance engine.
//!
//! This crate defines the value types shared by every other crate in the workspace:
//! holder addresses, proposal identifiers, token amounts, timestamps and the clock
//! abstraction the host uses to supply the current time.

pub mod address;
pub mod amount;
pub mod id;
pub mod time;

pub use address::Address;
pub use amount::TokenAmount;
pub use id::ProposalId;
pub use time::{Clock, FixedClock, SystemClock, Timestamp, SECONDS_PER_DAY};
