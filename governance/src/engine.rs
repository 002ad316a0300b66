//! Governance engine: the boundary every host talks to.
//!
//! Owns the registry and the balance oracle, applies the access guard, and
//! emits a [`GovernanceEvent`] after each successful operation. Caller identity
//! and the current time are explicit arguments on every call; the engine holds
//! no ambient state.

use tally_store::{BalanceOracle, GovernanceStore};
use tally_types::{Address, ProposalId, Timestamp, TokenAmount};
use tracing::info;

use crate::error::GovernanceError;
use crate::event::{EventBus, GovernanceEvent};
use crate::guard::AccessGuard;
use crate::params::ProposalParams;
use crate::persist;
use crate::proposal::{Proposal, ProposalStatus, VoteRecord};
use crate::registry::ProposalRegistry;
use crate::settlement::{Settlement, SettlementEngine};
use crate::voting::VotingEngine;

pub struct GovernanceEngine<O> {
    registry: ProposalRegistry,
    oracle: O,
    events: EventBus,
}

impl<O: BalanceOracle> GovernanceEngine<O> {
    pub fn new(oracle: O) -> Self {
        Self::with_registry(oracle, ProposalRegistry::new())
    }

    pub fn with_registry(oracle: O, registry: ProposalRegistry) -> Self {
        Self {
            registry,
            oracle,
            events: EventBus::new(),
        }
    }

    /// Register a listener for every event this engine emits.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn registry(&self) -> &ProposalRegistry {
        &self.registry
    }

    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Undo the creation of `id`, the newest proposal, freeing its id again.
    pub fn revert_create(&mut self, id: ProposalId) -> Result<Proposal, GovernanceError> {
        self.registry.revert_create(id)
    }

    /// Put back an earlier copy of an existing proposal.
    pub fn replace_proposal(&mut self, proposal: Proposal) -> Result<Proposal, GovernanceError> {
        self.registry.replace_proposal(proposal)
    }

    // ── Mutating operations ─────────────────────────────────────────────

    /// Create a proposal on behalf of `caller`.
    pub fn propose(
        &mut self,
        caller: &Address,
        params: ProposalParams,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        AccessGuard::require_holder(&self.oracle, caller)?;
        let id = self.registry.create(params, caller, now)?;
        let deadline = self.registry.get(id)?.deadline();
        info!(proposal = %id, creator = %caller, %deadline, "proposal created");

        self.events.emit(&GovernanceEvent::ProposalCreated {
            proposal_id: id,
            creator: caller.clone(),
            deadline,
        });
        Ok(id)
    }

    /// Cast `caller`'s vote and return the weight frozen for them.
    pub fn vote(
        &mut self,
        caller: &Address,
        id: ProposalId,
        support: bool,
        now: Timestamp,
    ) -> Result<TokenAmount, GovernanceError> {
        let weight =
            VotingEngine.cast_vote(&mut self.registry, &self.oracle, id, support, caller, now)?;
        self.events.emit(&GovernanceEvent::VoteCast {
            voter: caller.clone(),
            proposal_id: id,
            support,
            weight,
        });
        Ok(weight)
    }

    /// Report the terminal outcome once the deadline has passed.
    ///
    /// Nothing is marked settled; every call recomputes the same outcome and
    /// emits a fresh `VoteEnded`.
    pub fn finalize(
        &self,
        caller: &Address,
        id: ProposalId,
        now: Timestamp,
    ) -> Result<Settlement, GovernanceError> {
        let settlement =
            SettlementEngine.finalize(&self.registry, &self.oracle, id, caller, now)?;
        let tally = settlement.tally;
        self.events.emit(&GovernanceEvent::VoteEnded {
            proposal_id: id,
            total_votes_yes: tally.votes_yes(),
            total_weight_yes: tally.weight_yes(),
            total_votes_no: tally.votes_no(),
            total_weight_no: tally.weight_no(),
            status: settlement.status,
        });
        Ok(settlement)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn proposal(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.registry.get(id)
    }

    pub fn proposal_exists(&self, id: ProposalId) -> bool {
        self.registry.exists(id)
    }

    /// Current standing, with or without the deadline having passed.
    pub fn proposal_status(&self, id: ProposalId) -> Result<ProposalStatus, GovernanceError> {
        SettlementEngine.status(&self.registry, id)
    }

    pub fn has_voted(&self, id: ProposalId, voter: &Address) -> Result<bool, GovernanceError> {
        Ok(self.registry.get(id)?.has_voted(voter))
    }

    /// Frozen weight of `voter` on `id`; zero if they have not voted.
    pub fn vote_weight(
        &self,
        id: ProposalId,
        voter: &Address,
    ) -> Result<TokenAmount, GovernanceError> {
        Ok(self.registry.get(id)?.vote_weight(voter))
    }

    pub fn vote_of(
        &self,
        id: ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, GovernanceError> {
        Ok(self.registry.get(id)?.vote_of(voter).copied())
    }

    /// Seconds until voting closes, zero once it has.
    pub fn remaining_time(&self, id: ProposalId, now: Timestamp) -> Result<u64, GovernanceError> {
        Ok(self.registry.get(id)?.deadline().remaining_from(now))
    }

    pub fn active_proposals(&self, now: Timestamp) -> Vec<ProposalId> {
        self.registry.list_active(now)
    }

    pub fn proposals_by_creator(&self, creator: &Address) -> Vec<ProposalId> {
        self.registry.list_by_creator(creator)
    }

    pub fn all_proposals(&self) -> Vec<ProposalId> {
        self.registry.ids().to_vec()
    }

    pub fn proposal_count(&self) -> usize {
        self.registry.len()
    }

    // ── Persistence ─────────────────────────────────────────────────────

    /// Serialize the registry for a checkpoint.
    pub fn save_state(&self) -> Result<Vec<u8>, GovernanceError> {
        persist::encode_snapshot(&self.registry)
    }

    /// Restore an engine from a checkpoint taken with [`Self::save_state`].
    pub fn load_state(oracle: O, data: &[u8]) -> Result<Self, GovernanceError> {
        Ok(Self::with_registry(oracle, persist::decode_snapshot(data)?))
    }

    /// Restore an engine from a proposal store.
    pub fn load_from_store<S: GovernanceStore + ?Sized>(
        oracle: O,
        store: &S,
    ) -> Result<Self, GovernanceError> {
        Ok(Self::with_registry(oracle, persist::load_registry(store)?))
    }

    /// Replace the in-memory registry with what `store` holds now.
    /// Listeners are kept.
    pub fn reload<S: GovernanceStore + ?Sized>(&mut self, store: &S) -> Result<(), GovernanceError> {
        self.registry = persist::load_registry(store)?;
        Ok(())
    }

    /// Write proposal `id` (and the next id) to `store` if it is still at
    /// `expected_revision`. Returns the new revision.
    pub fn persist_proposal<S: GovernanceStore + ?Sized>(
        &self,
        store: &S,
        id: ProposalId,
        expected_revision: u64,
    ) -> Result<u64, GovernanceError> {
        persist::save_proposal(store, &self.registry, id, expected_revision)
    }

    /// Write the whole registry to `store`. Returns the new revision.
    pub fn persist_all<S: GovernanceStore + ?Sized>(
        &self,
        store: &S,
        expected_revision: u64,
    ) -> Result<u64, GovernanceError> {
        persist::save_registry(store, &self.registry, expected_revision)
    }
}

impl<O> std::fmt::Debug for GovernanceEngine<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GovernanceEngine")
            .field("proposals", &self.registry.len())
            .field("next_id", &self.registry.next_id())
            .field("events", &self.events)
            .finish()
    }
}
