use thiserror::Error;

use crate::hash_types::BlockHash;
use crate::llmq_type::LLMQType;
use crate::CoreBlockHeight;

/// Errors raised while validating an LLMQ commitment or reconstructing a
/// quorum's member set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QuorumValidationError {
    /// A block required for validation is not known to the engine.
    #[error("required block {0} is not present")]
    RequiredBlockNotPresent(BlockHash),

    /// The height of a required block is not known to the engine.
    #[error("required height for block {0} is not present")]
    RequiredBlockHeightNotPresent(BlockHash),

    /// The masternode list at a required height has not been committed.
    #[error("required masternode list at height {0} is not present")]
    RequiredMasternodeListNotPresent(CoreBlockHeight),

    /// The engine has no block hash recorded for a required height.
    #[error("no known block at required height {0}")]
    RequiredBlockAtHeightNotPresent(CoreBlockHeight),

    /// A rotation snapshot required for member reconstruction is missing.
    #[error("required quorum snapshot for block {0} is not present")]
    RequiredSnapshotNotPresent(BlockHash),

    /// The chain-lock signature needed for the v20 quorum modifier is
    /// missing.
    #[error("required chain lock signature at height {0} for block {1} is not present")]
    RequiredChainLockNotPresent(CoreBlockHeight, BlockHash),

    /// No committed quorum of the signing type is available.
    #[error("no active quorum of type {0} available for signature verification")]
    NoActiveQuorumForSigning(LLMQType),

    /// The signer and valid-member bitsets have different lengths.
    #[error("signers bitset length {signers_len} does not match valid members bitset length {valid_members_len}")]
    MismatchedBitsetLengths {
        signers_len: usize,
        valid_members_len: usize,
    },

    /// A bitset length does not match the quorum size its type mandates.
    #[error("bitset length {found} does not match quorum size {expected}")]
    InvalidBitsetLength { expected: usize, found: usize },

    /// Not enough commitment signers.
    #[error("insufficient signers: required {required}, found {found}")]
    InsufficientSigners { required: usize, found: usize },

    /// Not enough valid members.
    #[error("insufficient valid members: required {required}, found {found}")]
    InsufficientValidMembers { required: usize, found: usize },

    /// A reconstructed rotating quorum has fewer members than the type's
    /// minimum size.
    #[error("insufficient quorum members after reconstruction: required {required}, found {found}")]
    InsufficientQuorumMembers { required: usize, found: usize },

    /// A snapshot skip-list index points outside the candidate member list.
    #[error("snapshot skip index {index} out of range for {member_count} members")]
    SnapshotSkipIndexOutOfRange { index: i64, member_count: usize },

    /// A rotated commitment's quorum index is outside the active quorum
    /// range of its type.
    #[error("quorum index {index} out of range, type has {quorum_count} active quorums")]
    InvalidQuorumIndex { index: i16, quorum_count: usize },

    /// A snapshot member bitset does not cover the reference list.
    #[error("snapshot member bitset covers {found} masternodes, list has {expected}")]
    SnapshotMemberListLengthMismatch { expected: usize, found: usize },

    /// A quorum commitment carries a public key that is not a valid G1
    /// point.
    #[error("invalid BLS public key: {0}")]
    InvalidBLSPublicKey(String),

    /// A quorum commitment carries a signature that is not a valid G2 point.
    #[error("invalid BLS signature: {0}")]
    InvalidBLSSignature(String),

    /// The aggregate commitment signature did not verify against the
    /// reconstructed signer key.
    #[error("all-commitment aggregated signature is not valid: {0}")]
    AllCommitmentAggregatedSignatureNotValid(String),

    /// The threshold signature did not verify against the quorum public key.
    #[error("threshold signature is not valid: {0}")]
    ThresholdSignatureNotValid(String),
}

impl QuorumValidationError {
    /// Whether the error is caused by context the engine does not (yet)
    /// have, rather than by the commitment itself being invalid. A diff
    /// carrying such a quorum is committed with the quorum marked skipped;
    /// anything else rejects the diff.
    pub fn is_missing_context(&self) -> bool {
        matches!(
            self,
            QuorumValidationError::RequiredBlockNotPresent(_)
                | QuorumValidationError::RequiredBlockHeightNotPresent(_)
                | QuorumValidationError::RequiredMasternodeListNotPresent(_)
                | QuorumValidationError::RequiredBlockAtHeightNotPresent(_)
                | QuorumValidationError::RequiredSnapshotNotPresent(_)
                | QuorumValidationError::RequiredChainLockNotPresent(_, _)
        )
    }

    /// Whether the error points at an inconsistent rotation snapshot.
    pub fn is_snapshot_inconsistency(&self) -> bool {
        matches!(
            self,
            QuorumValidationError::SnapshotSkipIndexOutOfRange { .. }
                | QuorumValidationError::SnapshotMemberListLengthMismatch { .. }
                | QuorumValidationError::InsufficientQuorumMembers { .. }
        )
    }
}
