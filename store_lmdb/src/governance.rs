//! LMDB implementation of GovernanceStore.
//!
//! Three databases back the store:
//!
//! - `proposals`: proposal id (big endian) to encoded record
//! - `proposal_index`: insertion position (big endian) to proposal id, so a
//!   cursor walk yields ids in first-write order
//! - `meta`: registry metadata plus the store revision
//!
//! A batch is applied inside one write transaction. LMDB admits one writer at
//! a time across every process sharing the directory, so checking the
//! revision inside that transaction is enough to turn a stale writer away.

use std::sync::Arc;

use heed::types::Bytes;
use heed::{Database, Env, RoTxn};
use tally_store::{GovernanceBatch, GovernanceStore, StoreError};
use tally_types::ProposalId;
use tracing::{debug, warn};

use crate::LmdbError;

/// Meta key holding the store revision (u64, little endian). Reserved.
pub const REVISION_KEY: &str = "store_revision";

pub struct LmdbGovernanceStore {
    pub(crate) env: Arc<Env>,
    pub(crate) proposals_db: Database<Bytes, Bytes>,
    pub(crate) index_db: Database<Bytes, Bytes>,
    pub(crate) meta_db: Database<Bytes, Bytes>,
}

fn decode_u64(bytes: &[u8], what: &str) -> Result<u64, LmdbError> {
    let raw: [u8; 8] = bytes
        .try_into()
        .map_err(|_| LmdbError::Serialization(format!("{what} has unexpected byte length")))?;
    Ok(u64::from_be_bytes(raw))
}

impl LmdbGovernanceStore {
    fn read_revision(&self, txn: &RoTxn) -> Result<u64, LmdbError> {
        match self.meta_db.get(txn, REVISION_KEY.as_bytes())? {
            Some(bytes) => {
                let raw: [u8; 8] = bytes.try_into().map_err(|_| {
                    LmdbError::Serialization("store revision has unexpected byte length".to_string())
                })?;
                Ok(u64::from_le_bytes(raw))
            }
            None => Ok(0),
        }
    }
}

impl GovernanceStore for LmdbGovernanceStore {
    fn get_proposal(&self, id: ProposalId) -> Result<Vec<u8>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .proposals_db
            .get(&rtxn, &id.get().to_be_bytes())
            .map_err(LmdbError::from)?
            .ok_or_else(|| LmdbError::NotFound(format!("proposal {id}")))?;
        Ok(val.to_vec())
    }

    fn proposal_ids(&self) -> Result<Vec<ProposalId>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let mut ids = Vec::new();
        for entry in self.index_db.iter(&rtxn).map_err(LmdbError::from)? {
            let (_, value) = entry.map_err(LmdbError::from)?;
            ids.push(ProposalId::new(decode_u64(value, "index entry")?));
        }
        Ok(ids)
    }

    fn get_meta(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        let val = self
            .meta_db
            .get(&rtxn, key.as_bytes())
            .map_err(LmdbError::from)?;
        Ok(val.map(<[u8]>::to_vec))
    }

    fn revision(&self) -> Result<u64, StoreError> {
        let rtxn = self.env.read_txn().map_err(LmdbError::from)?;
        Ok(self.read_revision(&rtxn)?)
    }

    fn commit(&self, batch: &GovernanceBatch) -> Result<u64, StoreError> {
        if batch.meta().iter().any(|(key, _)| key == REVISION_KEY) {
            return Err(StoreError::Backend(format!("meta key '{REVISION_KEY}' is reserved")));
        }

        let mut wtxn = self.env.write_txn().map_err(LmdbError::from)?;
        let found = self.read_revision(&wtxn)?;
        if found != batch.expected_revision() {
            // Dropping the transaction aborts it.
            warn!(expected = batch.expected_revision(), found, "stale governance batch rejected");
            return Err(StoreError::Conflict {
                expected: batch.expected_revision(),
                found,
            });
        }

        let mut position = self.index_db.len(&wtxn).map_err(LmdbError::from)?;
        for (id, data) in batch.proposals() {
            let key = id.get().to_be_bytes();
            let is_new = self
                .proposals_db
                .get(&wtxn, &key)
                .map_err(LmdbError::from)?
                .is_none();
            self.proposals_db
                .put(&mut wtxn, &key, data)
                .map_err(LmdbError::from)?;
            if is_new {
                self.index_db
                    .put(&mut wtxn, &position.to_be_bytes(), &key)
                    .map_err(LmdbError::from)?;
                position += 1;
            }
        }
        for (key, value) in batch.meta() {
            self.meta_db
                .put(&mut wtxn, key.as_bytes(), value)
                .map_err(LmdbError::from)?;
        }

        let revision = found + 1;
        self.meta_db
            .put(&mut wtxn, REVISION_KEY.as_bytes(), &revision.to_le_bytes())
            .map_err(LmdbError::from)?;
        wtxn.commit().map_err(LmdbError::from)?;
        debug!(revision, proposals = batch.proposals().len(), "governance batch committed");
        Ok(revision)
    }
}
