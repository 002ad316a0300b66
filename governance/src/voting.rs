//! Voting engine: validates and records a single holder's vote.
//!
//! Preconditions are checked in a fixed order, each with its own failure:
//! the proposal exists, the voter holds tokens, the voter has not voted yet,
//! and the window is still open. The weight frozen for the voter is the
//! balance read by the eligibility check, so it reflects the moment of the
//! voter's first (and only) vote on that proposal.

use tally_store::BalanceOracle;
use tally_types::{Address, ProposalId, Timestamp, TokenAmount};
use tracing::{debug, info};

use crate::error::GovernanceError;
use crate::guard::AccessGuard;
use crate::registry::ProposalRegistry;

pub struct VotingEngine;

impl VotingEngine {
    /// Cast `voter`'s vote on proposal `id` and return the frozen weight.
    pub fn cast_vote<O: BalanceOracle + ?Sized>(
        &self,
        registry: &mut ProposalRegistry,
        oracle: &O,
        id: ProposalId,
        support: bool,
        voter: &Address,
        now: Timestamp,
    ) -> Result<TokenAmount, GovernanceError> {
        let proposal = registry.get_mut(id)?;
        let weight = AccessGuard::require_holder(oracle, voter)?;
        if proposal.has_voted(voter) {
            debug!(proposal = %id, voter = %voter, "rejected: already voted");
            return Err(GovernanceError::AlreadyVoted(voter.to_string()));
        }
        if !proposal.is_active(now) {
            debug!(proposal = %id, voter = %voter, %now, "rejected: voting closed");
            return Err(GovernanceError::VotingNotActive {
                deadline: proposal.deadline(),
            });
        }

        proposal.record_vote(voter.clone(), support, weight, now)?;
        info!(proposal = %id, voter = %voter, support, %weight, "vote cast");
        Ok(weight)
    }
}
