//! The governance node: wires the engine to a clock and a proposal store.
//!
//! Every mutating call takes `now` from the clock, applies the operation and
//! commits the touched proposal before returning. The commit only lands if
//! no other host wrote to the store since this node last read it. On a stale
//! write the node undoes its change, reloads and tries again; any other
//! failure undoes the change and is reported.
//!
//! Events raised by the engine are held back until the commit succeeds, so
//! subscribers never see an operation that was rolled back.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tally_governance::{
    EventBus, GovernanceEngine, GovernanceError, GovernanceEvent, Proposal, ProposalParams,
    ProposalStatus, Settlement, VoteRecord,
};
use tally_store::{BalanceOracle, GovernanceStore};
use tally_types::{Address, Clock, ProposalId, Timestamp, TokenAmount};
use tracing::{debug, error, info, warn};

use crate::error::NodeError;

/// Attempts per mutation before a stale write is reported to the caller.
const MAX_COMMIT_ATTEMPTS: u32 = 3;

type EventBuffer = Arc<Mutex<Vec<GovernanceEvent>>>;

/// How to take back an applied but uncommitted change.
enum Undo {
    Create(ProposalId),
    Restore(Box<Proposal>),
}

pub struct GovernanceNode<C, O, S> {
    engine: GovernanceEngine<O>,
    clock: C,
    store: S,
    /// Store revision the in-memory registry reflects.
    revision: u64,
    pending: EventBuffer,
    events: EventBus,
}

fn lock(buffer: &Mutex<Vec<GovernanceEvent>>) -> MutexGuard<'_, Vec<GovernanceEvent>> {
    buffer.lock().unwrap_or_else(PoisonError::into_inner)
}

fn log_event(event: &GovernanceEvent) {
    match event {
        GovernanceEvent::ProposalCreated {
            proposal_id,
            creator,
            deadline,
        } => info!(proposal = %proposal_id, %creator, %deadline, "event: proposal created"),
        GovernanceEvent::VoteCast {
            voter,
            proposal_id,
            support,
            weight,
        } => info!(proposal = %proposal_id, %voter, support, %weight, "event: vote cast"),
        GovernanceEvent::VoteEnded {
            proposal_id,
            total_votes_yes,
            total_weight_yes,
            total_votes_no,
            total_weight_no,
            status,
        } => info!(
            proposal = %proposal_id,
            total_votes_yes,
            %total_weight_yes,
            total_votes_no,
            %total_weight_no,
            %status,
            "event: vote ended"
        ),
    }
}

impl<C, O, S> GovernanceNode<C, O, S>
where
    C: Clock,
    O: BalanceOracle,
    S: GovernanceStore,
{
    /// Load the registry held by `store` and start serving requests.
    pub fn open(clock: C, oracle: O, store: S) -> Result<Self, NodeError> {
        // Revision first: a write landing during the load leaves us behind,
        // which the next commit detects.
        let revision = store.revision()?;
        let mut engine = GovernanceEngine::load_from_store(oracle, &store)?;

        let pending: EventBuffer = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&pending);
        engine.subscribe(Box::new(move |event| lock(&sink).push(event.clone())));

        let mut events = EventBus::new();
        events.subscribe(Box::new(log_event));

        info!(
            proposals = engine.proposal_count(),
            next_id = %engine.registry().next_id(),
            revision,
            "governance node opened"
        );
        Ok(Self {
            engine,
            clock,
            store,
            revision,
            pending,
            events,
        })
    }

    /// Register a listener for events of committed operations.
    pub fn subscribe(&mut self, listener: Box<dyn Fn(&GovernanceEvent) + Send + Sync>) {
        self.events.subscribe(listener);
    }

    pub fn engine(&self) -> &GovernanceEngine<O> {
        &self.engine
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Pick up whatever other hosts have written to the store.
    pub fn refresh(&mut self) -> Result<(), NodeError> {
        let revision = self.store.revision()?;
        self.engine.reload(&self.store)?;
        self.revision = revision;
        debug!(revision, proposals = self.engine.proposal_count(), "registry reloaded");
        Ok(())
    }

    fn publish_pending(&self) {
        let events = std::mem::take(&mut *lock(&self.pending));
        for event in &events {
            debug!(proposal = %event.proposal_id(), "publishing event");
            self.events.emit(event);
        }
    }

    fn discard_pending(&self) {
        lock(&self.pending).clear();
    }

    fn undo(&mut self, undo: Undo) {
        let result = match undo {
            Undo::Create(id) => self.engine.revert_create(id).map(drop),
            Undo::Restore(proposal) => self.engine.replace_proposal(*proposal).map(drop),
        };
        if let Err(e) = result {
            error!(error = %e, "undo failed, in-memory registry may be ahead of the store");
        }
    }

    /// Apply `op` and commit the proposal it touched, retrying on stale writes.
    fn mutate<T, F>(&mut self, mut op: F) -> Result<T, NodeError>
    where
        F: FnMut(&mut GovernanceEngine<O>, Timestamp) -> Result<(T, ProposalId, Undo), GovernanceError>,
    {
        let now = self.clock.now();
        let mut attempt = 1;
        loop {
            let (value, id, undo) = op(&mut self.engine, now)?;
            match self.engine.persist_proposal(&self.store, id, self.revision) {
                Ok(revision) => {
                    self.revision = revision;
                    self.publish_pending();
                    return Ok(value);
                }
                Err(e) => {
                    self.discard_pending();
                    self.undo(undo);
                    if e.is_conflict() && attempt < MAX_COMMIT_ATTEMPTS {
                        warn!(proposal = %id, attempt, error = %e, "store moved on, reloading");
                        self.refresh()?;
                        attempt += 1;
                        continue;
                    }
                    error!(proposal = %id, error = %e, "commit failed, change rolled back");
                    return Err(e.into());
                }
            }
        }
    }

    pub fn propose(
        &mut self,
        caller: &Address,
        params: ProposalParams,
    ) -> Result<ProposalId, NodeError> {
        self.mutate(|engine, now| {
            let id = engine.propose(caller, params.clone(), now)?;
            Ok((id, id, Undo::Create(id)))
        })
    }

    pub fn vote(
        &mut self,
        caller: &Address,
        id: ProposalId,
        support: bool,
    ) -> Result<TokenAmount, NodeError> {
        self.mutate(|engine, now| {
            let before = Box::new(engine.proposal(id)?.clone());
            let weight = engine.vote(caller, id, support, now)?;
            Ok((weight, id, Undo::Restore(before)))
        })
    }

    /// Settle `id`. Settlement writes nothing, so there is nothing to commit.
    pub fn finalize(&self, caller: &Address, id: ProposalId) -> Result<Settlement, NodeError> {
        let settled = self.engine.finalize(caller, id, self.clock.now())?;
        self.publish_pending();
        Ok(settled)
    }

    // ── Queries ─────────────────────────────────────────────────────────

    pub fn proposal(&self, id: ProposalId) -> Result<&Proposal, NodeError> {
        Ok(self.engine.proposal(id)?)
    }

    pub fn status(&self, id: ProposalId) -> Result<ProposalStatus, NodeError> {
        Ok(self.engine.proposal_status(id)?)
    }

    /// Seconds left in the voting window of `id`.
    pub fn remaining(&self, id: ProposalId) -> Result<u64, NodeError> {
        Ok(self.engine.remaining_time(id, self.clock.now())?)
    }

    pub fn has_voted(&self, id: ProposalId, voter: &Address) -> Result<bool, NodeError> {
        Ok(self.engine.has_voted(id, voter)?)
    }

    pub fn weight(&self, id: ProposalId, voter: &Address) -> Result<TokenAmount, NodeError> {
        Ok(self.engine.vote_weight(id, voter)?)
    }

    pub fn vote_of(
        &self,
        id: ProposalId,
        voter: &Address,
    ) -> Result<Option<VoteRecord>, NodeError> {
        Ok(self.engine.vote_of(id, voter)?)
    }

    pub fn active(&self) -> Vec<ProposalId> {
        self.engine.active_proposals(self.clock.now())
    }

    pub fn by_creator(&self, creator: &Address) -> Vec<ProposalId> {
        self.engine.proposals_by_creator(creator)
    }

    pub fn all(&self) -> Vec<ProposalId> {
        self.engine.all_proposals()
    }
}
