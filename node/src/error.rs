use thiserror::Error;

#[derive(Debug, Error)]
pub enum NodeError {
    #[error("governance error: {0}")]
    Governance(#[from] tally_governance::GovernanceError),

    #[error("store error: {0}")]
    Store(#[from] tally_store::StoreError),

    #[error("config error: {0}")]
    Config(String),
}

impl NodeError {
    /// The governance error behind this failure, if there is one.
    pub fn governance(&self) -> Option<&tally_governance::GovernanceError> {
        match self {
            Self::Governance(e) => Some(e),
            _ => None,
        }
    }
}
