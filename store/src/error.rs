use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("key not found: {0}")]
    NotFound(String),

    #[error("storage backend error: {0}")]
    Backend(String),

    #[error("database is corrupted: {0}")]
    Corruption(String),

    #[error("store moved to revision {found} while writing against revision {expected}")]
    Conflict { expected: u64, found: u64 },
}

impl StoreError {
    /// True when another writer committed first and the batch was not applied.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Conflict { .. })
    }
}
