//! Nullable store: thread-safe in-memory governance storage for testing.

use std::collections::HashMap;
use std::sync::Mutex;

use tally_store::{GovernanceBatch, GovernanceStore, StoreError};
use tally_types::ProposalId;

#[derive(Default)]
struct State {
    proposals: HashMap<ProposalId, Vec<u8>>,
    index: Vec<ProposalId>,
    meta: HashMap<String, Vec<u8>>,
    revision: u64,
}

/// An in-memory proposal store for testing.
///
/// One lock guards the whole state, so a batch is applied all at once.
pub struct NullGovernanceStore {
    state: Mutex<State>,
    fail_writes: Mutex<bool>,
}

impl NullGovernanceStore {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(State::default()),
            fail_writes: Mutex::new(false),
        }
    }

    /// Make every subsequent commit fail with a backend error.
    pub fn fail_writes(&self, fail: bool) {
        *self.fail_writes.lock().unwrap() = fail;
    }

    pub fn proposal_count(&self) -> usize {
        self.state.lock().unwrap().index.len()
    }
}

impl Default for NullGovernanceStore {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceStore for NullGovernanceStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Vec<u8>, StoreError> {
        self.state
            .lock()
            .unwrap()
            .proposals
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(id.to_string()))
    }

    fn proposal_ids(&self) -> Result<Vec<ProposalId>, StoreError> {
        Ok(self.state.lock().unwrap().index.clone())
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.state.lock().unwrap().meta.get(key).cloned())
    }

    fn revision(&self) -> Result<u64, StoreError> {
        Ok(self.state.lock().unwrap().revision)
    }

    fn commit(&self, batch: &GovernanceBatch) -> Result<u64, StoreError> {
        if *self.fail_writes.lock().unwrap() {
            return Err(StoreError::Backend("writes disabled".to_string()));
        }
        let mut state = self.state.lock().unwrap();
        if state.revision != batch.expected_revision() {
            return Err(StoreError::Conflict {
                expected: batch.expected_revision(),
                found: state.revision,
            });
        }
        for (id, data) in batch.proposals() {
            if state.proposals.insert(*id, data.clone()).is_none() {
                state.index.push(*id);
            }
        }
        for (key, value) in batch.meta() {
            state.meta.insert(key.clone(), value.clone());
        }
        state.revision += 1;
        Ok(state.revision)
    }
}
