use tally_store::StoreError;
use tally_types::{ProposalId, Timestamp};
use thiserror::Error;

/// The class of a rejected operation.
///
/// Every [`GovernanceError`] belongs to exactly one kind, so callers can branch
/// on the reason without matching individual variants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed proposal parameters.
    Validation,
    /// The acting principal holds no credential balance.
    Authorization,
    /// A lifecycle precondition does not hold.
    State,
    /// The referenced proposal does not exist.
    NotFound,
    /// Persistence failed outside the in-memory core.
    Storage,
}

#[derive(Debug, Error)]
pub enum GovernanceError {
    #[error("question must be longer than {min} characters, got {len}")]
    QuestionTooShort { len: usize, min: usize },

    #[error("majority {0}% is outside the allowed range")]
    MajorityOutOfRange(u16),

    #[error("duration of {0} days is outside the allowed range")]
    DurationOutOfRange(u16),

    #[error("{0} is not eligible: no governance token balance")]
    NotEligible(String),

    #[error("{0} has already voted on this proposal")]
    AlreadyVoted(String),

    #[error("voting is not active: closed at {deadline}")]
    VotingNotActive { deadline: Timestamp },

    #[error("voting is still active until {deadline}")]
    VotingStillActive { deadline: Timestamp },

    #[error("proposal {0} not found")]
    ProposalNotFound(ProposalId),

    #[error("vote tally would overflow")]
    TallyOverflow,

    #[error("proposal identifier space exhausted")]
    IdSpaceExhausted,

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("snapshot error: {0}")]
    Snapshot(String),
}

impl GovernanceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::QuestionTooShort { .. }
            | Self::MajorityOutOfRange(_)
            | Self::DurationOutOfRange(_) => ErrorKind::Validation,
            Self::NotEligible(_) => ErrorKind::Authorization,
            Self::AlreadyVoted(_)
            | Self::VotingNotActive { .. }
            | Self::VotingStillActive { .. }
            | Self::TallyOverflow
            | Self::IdSpaceExhausted => ErrorKind::State,
            Self::ProposalNotFound(_) => ErrorKind::NotFound,
            Self::Store(_) | Self::Snapshot(_) => ErrorKind::Storage,
        }
    }

    /// True when a write was refused because another writer got there first.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Store(e) if e.is_conflict())
    }
}
