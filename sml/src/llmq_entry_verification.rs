use std::fmt;

use crate::quorum_validation_error::QuorumValidationError;

/// Why a quorum's verification was skipped rather than performed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMQEntryVerificationSkipStatus {
    /// Context required to find the quorum's members (a block, a list, a
    /// chain lock or a rotation snapshot) is missing; the retained error
    /// names it.
    MissingContext(QuorumValidationError),
    /// The caller asked for structural application only.
    NotMarkedForVerification,
}

/// Verification state carried on every committed quorum.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum LLMQEntryVerificationStatus {
    /// Both BLS checks passed.
    Verified,
    /// Verification has not run.
    #[default]
    Unknown,
    /// Verification could not run; the reason is retained so a later diff
    /// or snapshot can trigger a retry.
    Skipped(LLMQEntryVerificationSkipStatus),
}

impl fmt::Display for LLMQEntryVerificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LLMQEntryVerificationStatus::Verified => write!(f, "verified"),
            LLMQEntryVerificationStatus::Unknown => write!(f, "unknown"),
            LLMQEntryVerificationStatus::Skipped(status) => write!(f, "skipped ({status:?})"),
        }
    }
}
