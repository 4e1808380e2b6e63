use thiserror::Error;

use dash_sml::bls_sig_utils::BLSSignature;
use dash_sml::consensus::encode;
use dash_sml::{BlockHash, QuorumValidationError, SmlError};

/// Errors surfaced by diff processing.
///
/// The classification helpers drive the sync loop's reaction: transient
/// errors are retried against the same or another source, peer faults
/// penalize the peer that supplied the payload.
#[derive(Debug, Error)]
pub enum ProcessDiffError {
    /// The payload could not be decoded.
    #[error("malformed message: {0}")]
    MalformedMessage(#[from] encode::Error),

    /// The diff is built on a base the engine does not hold (`expected`
    /// is the committed base's hash when there is a disagreement, `None`
    /// when the base is simply unknown).
    #[error("base list mismatch: diff built on {found}")]
    BaseMismatch {
        expected: Option<BlockHash>,
        found: BlockHash,
    },

    /// A reconstructed merkle root disagrees with an asserted one.
    #[error("merkle verification failed: {0}")]
    MerkleMismatch(SmlError),

    /// A quorum commitment failed BLS or structural validation.
    #[error("quorum validation failed: {0}")]
    QuorumSignatureInvalid(QuorumValidationError),

    /// A rotation snapshot is internally inconsistent.
    #[error("rotation snapshot inconsistent: {0}")]
    SnapshotInconsistent(QuorumValidationError),

    /// A chain-lock signature conflicts with an already stored one.
    #[error("conflicting chain lock signature for block {block_hash}")]
    ChainLockConflict {
        block_hash: BlockHash,
        existing: BLSSignature,
        offered: BLSSignature,
    },

    /// Required block data could not be resolved from the chain state or
    /// the backup provider. Retryable.
    #[error("required data unavailable for block {block_hash}")]
    DataUnavailable { block_hash: BlockHash },

    /// The chain is shutting down; the operation was abandoned.
    #[error("operation cancelled")]
    Cancelled,

    /// A broken internal invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ProcessDiffError {
    /// Stable category label for logs and metrics.
    pub fn category(&self) -> &'static str {
        match self {
            ProcessDiffError::MalformedMessage(_) => "message",
            ProcessDiffError::BaseMismatch { .. } => "base",
            ProcessDiffError::MerkleMismatch(_)
            | ProcessDiffError::QuorumSignatureInvalid(_)
            | ProcessDiffError::SnapshotInconsistent(_)
            | ProcessDiffError::ChainLockConflict { .. } => "consensus",
            ProcessDiffError::DataUnavailable { .. } => "availability",
            ProcessDiffError::Cancelled => "lifecycle",
            ProcessDiffError::Internal(_) => "internal",
        }
    }

    /// Whether retrying the same operation later can succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProcessDiffError::DataUnavailable { .. })
    }

    /// Whether the peer that supplied the payload is at fault and should
    /// be penalized. Cancellation and local data gaps never are.
    pub fn peer_fault(&self) -> bool {
        matches!(
            self,
            ProcessDiffError::MalformedMessage(_)
                | ProcessDiffError::BaseMismatch { .. }
                | ProcessDiffError::MerkleMismatch(_)
                | ProcessDiffError::QuorumSignatureInvalid(_)
                | ProcessDiffError::SnapshotInconsistent(_)
                | ProcessDiffError::ChainLockConflict { .. }
        )
    }
}

impl From<SmlError> for ProcessDiffError {
    fn from(error: SmlError) -> Self {
        match error {
            SmlError::BaseBlockHashMismatch { expected, found } => ProcessDiffError::BaseMismatch {
                expected: Some(expected),
                found,
            },
            SmlError::MissingStartMasternodeList(found)
            | SmlError::BaseBlockNotGenesis(found) => ProcessDiffError::BaseMismatch {
                expected: None,
                found,
            },
            mismatch @ (SmlError::MasternodeMerkleRootMismatch { .. }
            | SmlError::QuorumMerkleRootMismatch { .. }) => {
                ProcessDiffError::MerkleMismatch(mismatch)
            }
            SmlError::InvalidIndexInSignatureSet(_) => ProcessDiffError::MalformedMessage(
                encode::Error::ParseFailed("chain lock signature index out of range"),
            ),
            SmlError::BlockHashLookupFailed(block_hash) => {
                ProcessDiffError::DataUnavailable { block_hash }
            }
            SmlError::ChainLockConflict {
                block_hash,
                existing,
                offered,
            } => ProcessDiffError::ChainLockConflict {
                block_hash,
                existing,
                offered,
            },
            SmlError::QuorumValidation(error) => {
                if error.is_snapshot_inconsistency() {
                    ProcessDiffError::SnapshotInconsistent(error)
                } else {
                    ProcessDiffError::QuorumSignatureInvalid(error)
                }
            }
        }
    }
}
