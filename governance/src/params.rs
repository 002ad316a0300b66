//! Proposal parameters as submitted by a creator, and the bounds they must respect.
//!
//! A zero in any numeric field means "use the default". Everything else must
//! fall inside the allowed range, otherwise the proposal is rejected before
//! anything is stored.

use serde::{Deserialize, Serialize};

use crate::error::GovernanceError;

/// A question must be strictly longer than this many characters.
pub const QUESTION_MIN_EXCLUSIVE_CHARS: usize = 10;

pub const MIN_MAJORITY_PCT: u16 = 50;
pub const MAX_MAJORITY_PCT: u16 = 70;
pub const DEFAULT_MAJORITY_PCT: u16 = 50;

pub const MIN_DURATION_DAYS: u16 = 30;
pub const MAX_DURATION_DAYS: u16 = 180;
pub const DEFAULT_DURATION_DAYS: u16 = 60;

/// Floor applied to both participation minimums when the creator passes zero.
pub const MIN_PARTICIPATION_FLOOR: u64 = 1;

/// Parameters of a `propose` call, as supplied by the creator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposalParams {
    pub question: String,
    pub description: String,
    /// Minimum number of distinct voters. 0 means 1.
    pub minimum_votes: u64,
    /// Minimum cumulative weight. 0 means 1.
    pub minimum_weight: u64,
    /// Yes share (percent of cast weight) needed to pass. 0 means 50.
    pub majority_pct: u16,
    /// Voting window length in days. 0 means 60.
    pub duration_days: u16,
}

/// Parameters after validation, with every default applied.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedParams {
    pub question: String,
    pub description: String,
    pub minimum_votes: u64,
    pub minimum_weight: u64,
    pub majority_pct: u16,
    pub duration_days: u16,
}

impl ProposalParams {
    pub fn new(question: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            description: description.into(),
            ..Self::default()
        }
    }

    pub fn with_minimums(mut self, minimum_votes: u64, minimum_weight: u64) -> Self {
        self.minimum_votes = minimum_votes;
        self.minimum_weight = minimum_weight;
        self
    }

    pub fn with_majority(mut self, majority_pct: u16) -> Self {
        self.majority_pct = majority_pct;
        self
    }

    pub fn with_duration_days(mut self, duration_days: u16) -> Self {
        self.duration_days = duration_days;
        self
    }

    /// Check every bound and apply defaults.
    pub fn resolve(self) -> Result<ResolvedParams, GovernanceError> {
        let majority_pct = match self.majority_pct {
            0 => DEFAULT_MAJORITY_PCT,
            pct if (MIN_MAJORITY_PCT..=MAX_MAJORITY_PCT).contains(&pct) => pct,
            pct => return Err(GovernanceError::MajorityOutOfRange(pct)),
        };
        let duration_days = match self.duration_days {
            0 => DEFAULT_DURATION_DAYS,
            days if (MIN_DURATION_DAYS..=MAX_DURATION_DAYS).contains(&days) => days,
            days => return Err(GovernanceError::DurationOutOfRange(days)),
        };
        let len = self.question.chars().count();
        if len <= QUESTION_MIN_EXCLUSIVE_CHARS {
            return Err(GovernanceError::QuestionTooShort {
                len,
                min: QUESTION_MIN_EXCLUSIVE_CHARS,
            });
        }

        Ok(ResolvedParams {
            question: self.question,
            description: self.description,
            minimum_votes: self.minimum_votes.max(MIN_PARTICIPATION_FLOOR),
            minimum_weight: self.minimum_weight.max(MIN_PARTICIPATION_FLOOR),
            majority_pct,
            duration_days,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    const QUESTION: &str = "Fund the new bridge?";

    #[test]
    fn zeros_resolve_to_defaults() {
        let resolved = ProposalParams::new(QUESTION, "").resolve().unwrap();
        assert_eq!(resolved.majority_pct, 50);
        assert_eq!(resolved.duration_days, 60);
        assert_eq!(resolved.minimum_votes, 1);
        assert_eq!(resolved.minimum_weight, 1);
    }

    #[test]
    fn explicit_values_are_kept() {
        let resolved = ProposalParams::new(QUESTION, "details")
            .with_minimums(10, 5_000)
            .with_majority(70)
            .with_duration_days(180)
            .resolve()
            .unwrap();
        assert_eq!(resolved.minimum_votes, 10);
        assert_eq!(resolved.minimum_weight, 5_000);
        assert_eq!(resolved.majority_pct, 70);
        assert_eq!(resolved.duration_days, 180);
        assert_eq!(resolved.description, "details");
    }

    #[test]
    fn majority_bounds() {
        for pct in [1u16, 49, 71, 100] {
            let err = ProposalParams::new(QUESTION, "")
                .with_majority(pct)
                .resolve()
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::Validation, "pct {pct}");
        }
        for pct in [50u16, 60, 70] {
            assert!(ProposalParams::new(QUESTION, "").with_majority(pct).resolve().is_ok());
        }
    }

    #[test]
    fn duration_bounds() {
        for days in [1u16, 29, 181, 365] {
            let err = ProposalParams::new(QUESTION, "")
                .with_duration_days(days)
                .resolve()
                .unwrap_err();
            assert!(matches!(err, GovernanceError::DurationOutOfRange(d) if d == days));
        }
        for days in [30u16, 90, 180] {
            assert!(ProposalParams::new(QUESTION, "")
                .with_duration_days(days)
                .resolve()
                .is_ok());
        }
    }

    #[test]
    fn question_must_exceed_ten_characters() {
        let err = ProposalParams::new("ten chars!", "").resolve().unwrap_err();
        assert!(matches!(err, GovernanceError::QuestionTooShort { len: 10, .. }));
        assert!(ProposalParams::new("eleven char", "").resolve().is_ok());
    }

    #[test]
    fn question_length_counts_characters_not_bytes() {
        // 10 characters, 20 bytes
        let err = ProposalParams::new("éééééééééé", "").resolve().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);
    }
}
