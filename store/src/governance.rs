//! Governance storage trait.
//!
//! The persisted layout is an append-only, insertion-ordered list of proposal
//! ids alongside a keyed map from id to the encoded proposal record, plus a
//! small key/value area for registry metadata (the next id to assign).
//!
//! Writes go through [`GovernanceBatch`]: everything in a batch lands in one
//! transaction, and only if the store is still at the revision the writer
//! last read. Every committed batch bumps the revision, so two writers that
//! loaded the same state cannot both commit on top of it.

use std::sync::Arc;

use crate::StoreError;
use tally_types::ProposalId;

/// Writes applied together by [`GovernanceStore::commit`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GovernanceBatch {
    expected_revision: u64,
    proposals: Vec<(ProposalId, Vec<u8>)>,
    meta: Vec<(String, Vec<u8>)>,
}

impl GovernanceBatch {
    /// Start a batch that only commits while the store is at `expected_revision`.
    pub fn new(expected_revision: u64) -> Self {
        Self {
            expected_revision,
            ..Self::default()
        }
    }

    /// Store a proposal record. The first write of an id appends it to the index.
    pub fn put_proposal(&mut self, id: ProposalId, data: Vec<u8>) -> &mut Self {
        self.proposals.push((id, data));
        self
    }

    pub fn put_meta(&mut self, key: &str, value: Vec<u8>) -> &mut Self {
        self.meta.push((key.to_string(), value));
        self
    }

    pub fn expected_revision(&self) -> u64 {
        self.expected_revision
    }

    pub fn proposals(&self) -> &[(ProposalId, Vec<u8>)] {
        &self.proposals
    }

    pub fn meta(&self) -> &[(String, Vec<u8>)] {
        &self.meta
    }
}

/// Trait for storing governance state.
pub trait GovernanceStore {
    /// Get a proposal record by id.
    fn get_proposal(&self, id: ProposalId) -> Result<Vec<u8>, StoreError>;

    /// All stored ids, in the order they were first written.
    fn proposal_ids(&self) -> Result<Vec<ProposalId>, StoreError>;

    /// Get a metadata value; `None` when the key was never written.
    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Number of batches committed so far. An empty store is at revision 0.
    fn revision(&self) -> Result<u64, StoreError>;

    /// Apply `batch` atomically and return the new revision.
    ///
    /// Fails with [`StoreError::Conflict`], writing nothing, when the store is
    /// no longer at `batch.expected_revision()`.
    fn commit(&self, batch: &GovernanceBatch) -> Result<u64, StoreError>;
}

impl<S: GovernanceStore + ?Sized> GovernanceStore for &S {
    fn get_proposal(&self, id: ProposalId) -> Result<Vec<u8>, StoreError> {
        (**self).get_proposal(id)
    }

    fn proposal_ids(&self) -> Result<Vec<ProposalId>, StoreError> {
        (**self).proposal_ids()
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_meta(key)
    }

    fn revision(&self) -> Result<u64, StoreError> {
        (**self).revision()
    }

    fn commit(&self, batch: &GovernanceBatch) -> Result<u64, StoreError> {
        (**self).commit(batch)
    }
}

impl<S: GovernanceStore + ?Sized> GovernanceStore for Arc<S> {
    fn get_proposal(&self, id: ProposalId) -> Result<Vec<u8>, StoreError> {
        (**self).get_proposal(id)
    }

    fn proposal_ids(&self) -> Result<Vec<ProposalId>, StoreError> {
        (**self).proposal_ids()
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        (**self).get_meta(key)
    }

    fn revision(&self) -> Result<u64, StoreError> {
        (**self).revision()
    }

    fn commit(&self, batch: &GovernanceBatch) -> Result<u64, StoreError> {
        (**self).commit(batch)
    }
}
