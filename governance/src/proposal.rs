//! Proposals, their running tallies and the per-voter ledger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tally_types::{Address, ProposalId, Timestamp, TokenAmount};

use crate::error::GovernanceError;
use crate::params::ResolvedParams;

/// Resolved standing of a proposal.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProposalStatus {
    /// Participation minimums met and the yes share reached the majority.
    Yes,
    /// Participation minimums met but the yes share fell short, or nobody voted.
    No,
    /// Fewer voters or less weight than the proposal's minimums.
    InsufficientVotersInterest,
}

impl ProposalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "YES",
            Self::No => "NO",
            Self::InsufficientVotersInterest => "INSUFFICIENT_VOTERS_INTEREST",
        }
    }
}

impl std::fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Accumulated votes on one proposal.
///
/// Totals are kept alongside the per-side counters and always equal their sum;
/// the only way to change a tally is [`Tally::record`], which never decreases
/// anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tally {
    votes_yes: u64,
    votes_no: u64,
    weight_yes: TokenAmount,
    weight_no: TokenAmount,
    total_votes: u64,
    total_weight: TokenAmount,
}

impl Tally {
    /// Build a tally from per-side counters, or `None` if a total overflows.
    pub fn from_parts(
        votes_yes: u64,
        weight_yes: TokenAmount,
        votes_no: u64,
        weight_no: TokenAmount,
    ) -> Option<Self> {
        Some(Self {
            votes_yes,
            votes_no,
            weight_yes,
            weight_no,
            total_votes: votes_yes.checked_add(votes_no)?,
            total_weight: weight_yes.checked_add(weight_no)?,
        })
    }

    pub fn votes_yes(&self) -> u64 {
        self.votes_yes
    }

    pub fn votes_no(&self) -> u64 {
        self.votes_no
    }

    pub fn weight_yes(&self) -> TokenAmount {
        self.weight_yes
    }

    pub fn weight_no(&self) -> TokenAmount {
        self.weight_no
    }

    pub fn total_votes(&self) -> u64 {
        self.total_votes
    }

    pub fn total_weight(&self) -> TokenAmount {
        self.total_weight
    }

    /// Add one vote of `weight` to the chosen side.
    ///
    /// All sums are computed before anything is written, so an overflow leaves
    /// the tally untouched.
    pub fn record(&mut self, support: bool, weight: TokenAmount) -> Result<(), GovernanceError> {
        let (votes, side_weight) = if support {
            (self.votes_yes, self.weight_yes)
        } else {
            (self.votes_no, self.weight_no)
        };
        let votes = votes.checked_add(1).ok_or(GovernanceError::TallyOverflow)?;
        let side_weight = side_weight
            .checked_add(weight)
            .ok_or(GovernanceError::TallyOverflow)?;
        let total_votes = self
            .total_votes
            .checked_add(1)
            .ok_or(GovernanceError::TallyOverflow)?;
        let total_weight = self
            .total_weight
            .checked_add(weight)
            .ok_or(GovernanceError::TallyOverflow)?;

        if support {
            self.votes_yes = votes;
            self.weight_yes = side_weight;
        } else {
            self.votes_no = votes;
            self.weight_no = side_weight;
        }
        self.total_votes = total_votes;
        self.total_weight = total_weight;
        Ok(())
    }
}

/// One holder's vote on one proposal. Written once, never changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteRecord {
    pub support: bool,
    /// Balance read at the voter's first vote on this proposal.
    pub weight: TokenAmount,
    pub cast_at: Timestamp,
}

/// A governance proposal.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proposal {
    id: ProposalId,
    creator: Address,
    question: String,
    description: String,
    minimum_votes: u64,
    minimum_weight: u64,
    majority_pct: u16,
    created_at: Timestamp,
    deadline: Timestamp,
    tally: Tally,
    /// Voter → frozen vote. Keyed by address so a voter appears at most once.
    ledger: BTreeMap<Address, VoteRecord>,
}

impl Proposal {
    pub(crate) fn new(
        id: ProposalId,
        creator: Address,
        params: ResolvedParams,
        now: Timestamp,
    ) -> Self {
        Self {
            id,
            creator,
            question: params.question,
            description: params.description,
            minimum_votes: params.minimum_votes,
            minimum_weight: params.minimum_weight,
            majority_pct: params.majority_pct,
            created_at: now,
            deadline: now.plus_days(u64::from(params.duration_days)),
            tally: Tally::default(),
            ledger: BTreeMap::new(),
        }
    }

    pub fn id(&self) -> ProposalId {
        self.id
    }

    pub fn creator(&self) -> &Address {
        &self.creator
    }

    pub fn question(&self) -> &str {
        &self.question
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn minimum_votes(&self) -> u64 {
        self.minimum_votes
    }

    pub fn minimum_weight(&self) -> u64 {
        self.minimum_weight
    }

    pub fn majority_pct(&self) -> u16 {
        self.majority_pct
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub fn deadline(&self) -> Timestamp {
        self.deadline
    }

    pub fn tally(&self) -> &Tally {
        &self.tally
    }

    /// Voting is open strictly before the deadline.
    pub fn is_active(&self, now: Timestamp) -> bool {
        now < self.deadline
    }

    pub fn has_voted(&self, voter: &Address) -> bool {
        self.ledger.contains_key(voter)
    }

    pub fn vote_of(&self, voter: &Address) -> Option<&VoteRecord> {
        self.ledger.get(voter)
    }

    /// Frozen weight of `voter`, zero if they have not voted.
    pub fn vote_weight(&self, voter: &Address) -> TokenAmount {
        self.ledger
            .get(voter)
            .map(|record| record.weight)
            .unwrap_or(TokenAmount::ZERO)
    }

    /// Number of distinct voters in the ledger.
    pub fn voter_count(&self) -> usize {
        self.ledger.len()
    }

    pub fn voters(&self) -> impl Iterator<Item = (&Address, &VoteRecord)> {
        self.ledger.iter()
    }

    /// Freeze `voter`'s weight and add it to the tally.
    ///
    /// Callers have already checked the voter is new and the window is open.
    pub(crate) fn record_vote(
        &mut self,
        voter: Address,
        support: bool,
        weight: TokenAmount,
        now: Timestamp,
    ) -> Result<(), GovernanceError> {
        debug_assert!(!self.ledger.contains_key(&voter));
        self.tally.record(support, weight)?;
        self.ledger.insert(
            voter,
            VoteRecord {
                support,
                weight,
                cast_at: now,
            },
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::ProposalParams;

    fn proposal(now: u64) -> Proposal {
        let params = ProposalParams::new("Adopt the new charter?", "")
            .with_duration_days(30)
            .resolve()
            .unwrap();
        Proposal::new(ProposalId::FIRST, Address::new("alice"), params, Timestamp::new(now))
    }

    #[test]
    fn deadline_is_creation_plus_duration() {
        let p = proposal(1_000);
        assert_eq!(p.deadline().as_secs(), 1_000 + 30 * 86_400);
        assert_eq!(p.created_at(), Timestamp::new(1_000));
    }

    #[test]
    fn active_strictly_before_deadline() {
        let p = proposal(0);
        let deadline = p.deadline();
        assert!(p.is_active(Timestamp::new(deadline.as_secs() - 1)));
        assert!(!p.is_active(deadline));
    }

    #[test]
    fn record_vote_updates_tally_and_ledger() {
        let mut p = proposal(0);
        p.record_vote(Address::new("bob"), true, TokenAmount::new(40), Timestamp::new(5))
            .unwrap();
        p.record_vote(Address::new("carol"), false, TokenAmount::new(60), Timestamp::new(6))
            .unwrap();

        let tally = p.tally();
        assert_eq!(tally.votes_yes(), 1);
        assert_eq!(tally.votes_no(), 1);
        assert_eq!(tally.total_votes(), 2);
        assert_eq!(tally.total_weight(), TokenAmount::new(100));
        assert!(p.has_voted(&Address::new("bob")));
        assert_eq!(p.vote_weight(&Address::new("carol")), TokenAmount::new(60));
        assert_eq!(p.vote_weight(&Address::new("dave")), TokenAmount::ZERO);
        assert_eq!(p.voter_count(), 2);
    }

    #[test]
    fn tally_overflow_leaves_state_untouched() {
        let mut tally = Tally::default();
        tally.record(true, TokenAmount::new(u128::MAX)).unwrap();
        let before = tally;
        let err = tally.record(false, TokenAmount::new(1)).unwrap_err();
        assert!(matches!(err, GovernanceError::TallyOverflow));
        assert_eq!(tally, before);
    }

    #[test]
    fn from_parts_computes_totals() {
        let tally =
            Tally::from_parts(3, TokenAmount::new(600), 2, TokenAmount::new(400)).unwrap();
        assert_eq!(tally.total_votes(), 5);
        assert_eq!(tally.total_weight(), TokenAmount::new(1_000));
        assert!(Tally::from_parts(u64::MAX, TokenAmount::ZERO, 1, TokenAmount::ZERO).is_none());
    }

    #[test]
    fn status_strings() {
        assert_eq!(ProposalStatus::Yes.to_string(), "YES");
        assert_eq!(
            ProposalStatus::InsufficientVotersInterest.as_str(),
            "INSUFFICIENT_VOTERS_INTEREST"
        );
    }
}
