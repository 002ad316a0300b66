//! Proposal registry: owns every proposal and hands out identifiers.
//!
//! Identifiers are sequential from 1 and never reused. Alongside the keyed
//! map the registry keeps an append-only index in creation order; the listing
//! queries walk that index so their output is always in creation order.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tally_types::{Address, ProposalId, Timestamp};
use tracing::debug;

use crate::error::GovernanceError;
use crate::params::ProposalParams;
use crate::proposal::Proposal;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProposalRegistry {
    proposals: HashMap<ProposalId, Proposal>,
    order: Vec<ProposalId>,
    next_id: ProposalId,
}

impl ProposalRegistry {
    pub fn new() -> Self {
        Self {
            proposals: HashMap::new(),
            order: Vec::new(),
            next_id: ProposalId::FIRST,
        }
    }

    /// Validate `params`, then store a new proposal and return its id.
    ///
    /// On any validation failure nothing is stored and no id is consumed.
    pub fn create(
        &mut self,
        params: ProposalParams,
        creator: &Address,
        now: Timestamp,
    ) -> Result<ProposalId, GovernanceError> {
        let resolved = params.resolve()?;
        let id = self.next_id;
        let next_id = id.next().ok_or(GovernanceError::IdSpaceExhausted)?;

        let proposal = Proposal::new(id, creator.clone(), resolved, now);
        debug!(
            proposal = %id,
            creator = %creator,
            deadline = %proposal.deadline(),
            "proposal stored"
        );
        self.proposals.insert(id, proposal);
        self.order.push(id);
        self.next_id = next_id;
        Ok(id)
    }

    pub fn exists(&self, id: ProposalId) -> bool {
        self.proposals.contains_key(&id)
    }

    pub fn get(&self, id: ProposalId) -> Result<&Proposal, GovernanceError> {
        self.proposals
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    pub(crate) fn get_mut(&mut self, id: ProposalId) -> Result<&mut Proposal, GovernanceError> {
        self.proposals
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))
    }

    /// Ids whose deadline is still ahead of `now`, in creation order.
    pub fn list_active(&self, now: Timestamp) -> Vec<ProposalId> {
        self.iter()
            .filter(|p| p.deadline() > now)
            .map(Proposal::id)
            .collect()
    }

    /// Ids created by `creator`, in creation order.
    pub fn list_by_creator(&self, creator: &Address) -> Vec<ProposalId> {
        self.iter()
            .filter(|p| p.creator() == creator)
            .map(Proposal::id)
            .collect()
    }

    /// Every id, in creation order.
    pub fn ids(&self) -> &[ProposalId] {
        &self.order
    }

    /// Proposals in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Proposal> {
        self.order.iter().filter_map(|id| self.proposals.get(id))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// The id the next successful `create` will assign.
    pub fn next_id(&self) -> ProposalId {
        self.next_id
    }

    /// Undo the most recent `create`, handing `id` back to the counter.
    ///
    /// Only the newest proposal can be withdrawn; older ids stay assigned.
    pub fn revert_create(&mut self, id: ProposalId) -> Result<Proposal, GovernanceError> {
        if self.order.last() != Some(&id) {
            return Err(GovernanceError::ProposalNotFound(id));
        }
        let proposal = self
            .proposals
            .remove(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        self.order.pop();
        self.next_id = id;
        debug!(proposal = %id, "proposal creation reverted");
        Ok(proposal)
    }

    /// Put back an earlier copy of an existing proposal, returning the current one.
    pub fn replace_proposal(&mut self, proposal: Proposal) -> Result<Proposal, GovernanceError> {
        let slot = self.get_mut(proposal.id())?;
        Ok(std::mem::replace(slot, proposal))
    }

    /// Rebuild a registry from stored records, given in creation order.
    ///
    /// Rejects duplicate or out-of-order ids and any id at or beyond `next_id`,
    /// since either would let a future `create` reuse an identifier.
    pub fn restore(
        proposals: Vec<Proposal>,
        next_id: ProposalId,
    ) -> Result<Self, GovernanceError> {
        let mut registry = Self {
            proposals: HashMap::with_capacity(proposals.len()),
            order: Vec::with_capacity(proposals.len()),
            next_id,
        };
        for proposal in proposals {
            let id = proposal.id();
            if id >= next_id {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {id} is not below next id {next_id}"
                )));
            }
            if registry.order.last().is_some_and(|last| *last >= id) {
                return Err(GovernanceError::Snapshot(format!(
                    "proposal {id} is out of creation order"
                )));
            }
            registry.order.push(id);
            registry.proposals.insert(id, proposal);
        }
        Ok(registry)
    }
}

impl Default for ProposalRegistry {
    fn default() -> Self {
        Self::new()
    }
}
