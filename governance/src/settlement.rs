//! Resolves a proposal's outcome from its tallies.
//!
//! Nothing is written here. `finalize` and `status` recompute the outcome
//! from the stored tallies each time they are called, so repeated calls after
//! the deadline always agree with each other.

use serde::{Deserialize, Serialize};
use tally_store::BalanceOracle;
use tally_types::{Address, ProposalId, Timestamp};
use tracing::{debug, info};

use crate::error::GovernanceError;
use crate::guard::AccessGuard;
use crate::proposal::{Proposal, ProposalStatus, Tally};
use crate::registry::ProposalRegistry;

/// The result of a `finalize` call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settlement {
    pub proposal_id: ProposalId,
    pub status: ProposalStatus,
    pub tally: Tally,
}

pub struct SettlementEngine;

impl SettlementEngine {
    /// Report the terminal outcome of proposal `id`.
    ///
    /// Requires the proposal to exist, `caller` to hold tokens, and the
    /// deadline to have passed, in that order.
    pub fn finalize<O: BalanceOracle + ?Sized>(
        &self,
        registry: &ProposalRegistry,
        oracle: &O,
        id: ProposalId,
        caller: &Address,
        now: Timestamp,
    ) -> Result<Settlement, GovernanceError> {
        let proposal = registry.get(id)?;
        AccessGuard::require_holder(oracle, caller)?;
        if proposal.is_active(now) {
            debug!(proposal = %id, %now, "rejected: finalize before deadline");
            return Err(GovernanceError::VotingStillActive {
                deadline: proposal.deadline(),
            });
        }

        let status = Self::resolve(proposal);
        info!(proposal = %id, caller = %caller, %status, "proposal settled");
        Ok(Settlement {
            proposal_id: id,
            status,
            tally: *proposal.tally(),
        })
    }

    /// Current standing of proposal `id`, whether or not voting has ended.
    pub fn status(
        &self,
        registry: &ProposalRegistry,
        id: ProposalId,
    ) -> Result<ProposalStatus, GovernanceError> {
        registry.get(id).map(Self::resolve)
    }

    /// Classify a proposal by its own minimums and majority.
    pub fn resolve(proposal: &Proposal) -> ProposalStatus {
        Self::classify(
            proposal.tally(),
            proposal.minimum_votes(),
            proposal.minimum_weight(),
            proposal.majority_pct(),
        )
    }

    /// The decision rule, first match wins:
    ///
    /// 1. fewer votes than `minimum_votes` or less weight than `minimum_weight`
    ///    → insufficient interest;
    /// 2. no weight cast at all → `No`;
    /// 3. `floor(yes * 100 / total) >= majority_pct` → `Yes`, else `No`.
    pub fn classify(
        tally: &Tally,
        minimum_votes: u64,
        minimum_weight: u64,
        majority_pct: u16,
    ) -> ProposalStatus {
        let total_weight = tally.total_weight().raw();
        if tally.total_votes() < minimum_votes || total_weight < u128::from(minimum_weight) {
            return ProposalStatus::InsufficientVotersInterest;
        }
        if total_weight == 0 {
            return ProposalStatus::No;
        }
        if yes_percentage(tally.weight_yes().raw(), total_weight) >= u128::from(majority_pct) {
            ProposalStatus::Yes
        } else {
            ProposalStatus::No
        }
    }
}

/// `floor(yes * 100 / total)` for `yes <= total`, `total > 0`.
///
/// When `yes * 100` does not fit in u128 both operands are scaled down by 128
/// first; at that magnitude the result can differ from the exact floor by at
/// most one point.
pub fn yes_percentage(yes: u128, total: u128) -> u128 {
    match yes.checked_mul(100) {
        Some(scaled) => scaled / total,
        None => ((yes >> 7) * 100) / (total >> 7),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::params::ProposalParams;
    use std::collections::HashMap;
    use tally_types::TokenAmount;

    fn tally(votes_yes: u64, yes: u128, votes_no: u64, no: u128) -> Tally {
        Tally::from_parts(votes_yes, TokenAmount::new(yes), votes_no, TokenAmount::new(no))
            .unwrap()
    }

    #[test]
    fn boundary_majority_passes_at_exact_threshold() {
        assert_eq!(
            SettlementEngine::classify(&tally(1, 600, 1, 400), 1, 1, 60),
            ProposalStatus::Yes
        );
        assert_eq!(
            SettlementEngine::classify(&tally(1, 599, 1, 401), 1, 1, 60),
            ProposalStatus::No
        );
    }

    #[test]
    fn percentage_is_floored() {
        // 2/3 = 66.6% floors to 66
        assert_eq!(yes_percentage(2, 3), 66);
        assert_eq!(
            SettlementEngine::classify(&tally(2, 2, 1, 1), 1, 1, 67),
            ProposalStatus::No
        );
        assert_eq!(
            SettlementEngine::classify(&tally(2, 2, 1, 1), 1, 1, 66),
            ProposalStatus::Yes
        );
    }

    #[test]
    fn insufficient_interest_takes_precedence() {
        // unanimous yes, but only 1 of 10 required voters
        assert_eq!(
            SettlementEngine::classify(&tally(1, 1_000_000, 0, 0), 10, 1, 50),
            ProposalStatus::InsufficientVotersInterest
        );
        // enough voters, not enough weight
        assert_eq!(
            SettlementEngine::classify(&tally(3, 10, 0, 0), 1, 11, 50),
            ProposalStatus::InsufficientVotersInterest
        );
    }

    #[test]
    fn zero_participation_with_zero_minimums_is_no() {
        assert_eq!(
            SettlementEngine::classify(&Tally::default(), 0, 0, 50),
            ProposalStatus::No
        );
    }

    #[test]
    fn default_minimums_without_votes_is_insufficient() {
        assert_eq!(
            SettlementEngine::classify(&Tally::default(), 1, 1, 50),
            ProposalStatus::InsufficientVotersInterest
        );
    }

    #[test]
    fn huge_weights_do_not_overflow() {
        let total = 1u128 << 126;
        assert_eq!(yes_percentage(total, total), 100);
        assert_eq!(yes_percentage(total / 2, total), 50);
        assert_eq!(yes_percentage(0, total), 0);
    }

    struct Balances(HashMap<Address, TokenAmount>);

    impl BalanceOracle for Balances {
        fn balance_of(&self, holder: &Address) -> TokenAmount {
            self.0.get(holder).copied().unwrap_or(TokenAmount::ZERO)
        }
    }

    fn registry_with_one() -> (ProposalRegistry, ProposalId, Timestamp) {
        let mut registry = ProposalRegistry::new();
        let id = registry
            .create(
                ProposalParams::new("Move the meetup to Fridays?", ""),
                &Address::new("alice"),
                Timestamp::new(0),
            )
            .unwrap();
        let deadline = registry.get(id).unwrap().deadline();
        (registry, id, deadline)
    }

    #[test]
    fn finalize_requires_deadline_passed() {
        let (registry, id, deadline) = registry_with_one();
        let oracle = Balances(HashMap::from([(Address::new("alice"), TokenAmount::new(1))]));
        let alice = Address::new("alice");

        let early = Timestamp::new(deadline.as_secs() - 1);
        let err = SettlementEngine
            .finalize(&registry, &oracle, id, &alice, early)
            .unwrap_err();
        assert!(matches!(err, GovernanceError::VotingStillActive { .. }));

        let settled = SettlementEngine
            .finalize(&registry, &oracle, id, &alice, deadline)
            .unwrap();
        assert_eq!(settled.status, ProposalStatus::InsufficientVotersInterest);
        assert_eq!(settled.proposal_id, id);
    }

    #[test]
    fn finalize_requires_eligible_caller() {
        let (registry, id, deadline) = registry_with_one();
        let oracle = Balances(HashMap::new());
        let err = SettlementEngine
            .finalize(&registry, &oracle, id, &Address::new("alice"), deadline)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Authorization);
    }

    #[test]
    fn status_does_not_need_deadline() {
        let (registry, id, _) = registry_with_one();
        assert_eq!(
            SettlementEngine.status(&registry, id).unwrap(),
            ProposalStatus::InsufficientVotersInterest
        );
        let err = SettlementEngine
            .status(&registry, ProposalId::new(42))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }
}
