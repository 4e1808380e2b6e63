use crate::hash_types::{QuorumCommitmentHash, QuorumEntryHash};
use crate::llmq_entry_verification::LLMQEntryVerificationStatus;
use crate::quorum_entry::QuorumEntry;

/// A quorum entry together with its derived hashes and verification state.
///
/// The entry hash is the merkle leaf; the commitment hash is the message
/// both BLS checks verify against. Both are fixed by the commitment's
/// content, so they are computed once when the quorum enters a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedQuorumEntry {
    pub quorum_entry: QuorumEntry,
    pub verified: LLMQEntryVerificationStatus,
    pub entry_hash: QuorumEntryHash,
    pub commitment_hash: QuorumCommitmentHash,
}

impl From<QuorumEntry> for QualifiedQuorumEntry {
    fn from(quorum_entry: QuorumEntry) -> Self {
        let entry_hash = quorum_entry.calculate_entry_hash();
        let commitment_hash = quorum_entry.calculate_commitment_hash();
        QualifiedQuorumEntry {
            quorum_entry,
            verified: LLMQEntryVerificationStatus::Unknown,
            entry_hash,
            commitment_hash,
        }
    }
}
