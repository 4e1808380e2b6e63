use thiserror::Error;

use crate::bls_sig_utils::BLSSignature;
use crate::hash_types::{BlockHash, MerkleRootMasternodeList, MerkleRootQuorums};
use crate::quorum_validation_error::QuorumValidationError;

/// Errors raised while reconstructing or committing masternode lists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SmlError {
    /// The diff's base block hash does not match the list it is being
    /// applied to.
    #[error("base block hash mismatch: expected {expected}, found {found}")]
    BaseBlockHashMismatch {
        expected: BlockHash,
        found: BlockHash,
    },

    /// The engine holds no committed list for the diff's base block.
    #[error("missing start masternode list for block {0}")]
    MissingStartMasternodeList(BlockHash),

    /// A bootstrap diff must be based on the zero hash or the network
    /// genesis block.
    #[error("base block {0} is neither empty nor the genesis block")]
    BaseBlockNotGenesis(BlockHash),

    /// The recomputed masternode merkle root disagrees with the asserted
    /// one.
    #[error("masternode merkle root mismatch: expected {expected}, calculated {calculated}")]
    MasternodeMerkleRootMismatch {
        expected: MerkleRootMasternodeList,
        calculated: MerkleRootMasternodeList,
    },

    /// The recomputed quorum merkle root disagrees with the asserted one.
    #[error("quorum merkle root mismatch: expected {expected}, calculated {calculated}")]
    QuorumMerkleRootMismatch {
        expected: MerkleRootQuorums,
        calculated: MerkleRootQuorums,
    },

    /// A chain-lock signature set references a new-quorum index the diff
    /// does not contain.
    #[error("chain lock signature set references invalid quorum index {0}")]
    InvalidIndexInSignatureSet(u16),

    /// The engine cannot map a block hash to a height.
    #[error("no known height for block {0}")]
    BlockHashLookupFailed(BlockHash),

    /// A signature was offered for a block that already has a different
    /// stored chain-lock signature.
    #[error("conflicting chain lock signature for block {block_hash}")]
    ChainLockConflict {
        block_hash: BlockHash,
        existing: BLSSignature,
        offered: BLSSignature,
    },

    /// A quorum commitment in the diff failed validation.
    #[error(transparent)]
    QuorumValidation(#[from] QuorumValidationError),
}
