//! An immutable masternode list snapshot at a block.

mod apply_diff;
mod merkle_roots;
mod scores_for_quorum;

pub use merkle_roots::merkle_root_from_hashes;
pub use scores_for_quorum::masternodes_by_score_descending;

use std::collections::BTreeMap;

use crate::hash_types::{BlockHash, MerkleRootMasternodeList, MerkleRootQuorums, ProTxHash, QuorumHash};
use crate::llmq_type::LLMQType;
use crate::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;
use crate::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use crate::CoreBlockHeight;

/// The full masternode set and active quorums at one block.
///
/// Lists are value types: applying a diff produces a new list and never
/// mutates the base, so a failed verification leaves nothing to roll back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasternodeList {
    pub block_hash: BlockHash,
    pub known_height: CoreBlockHeight,
    /// Root over the entry hashes, recomputed whenever the list changes.
    pub masternode_merkle_root: Option<MerkleRootMasternodeList>,
    pub llmq_merkle_root: Option<MerkleRootQuorums>,
    pub masternodes: BTreeMap<ProTxHash, QualifiedMasternodeListEntry>,
    pub quorums: BTreeMap<LLMQType, BTreeMap<QuorumHash, QualifiedQuorumEntry>>,
}

impl MasternodeList {
    /// Builds a list and computes its merkle roots.
    pub fn new(
        masternodes: BTreeMap<ProTxHash, QualifiedMasternodeListEntry>,
        quorums: BTreeMap<LLMQType, BTreeMap<QuorumHash, QualifiedQuorumEntry>>,
        block_hash: BlockHash,
        block_height: CoreBlockHeight,
    ) -> Self {
        let mut list = MasternodeList {
            block_hash,
            known_height: block_height,
            masternode_merkle_root: None,
            llmq_merkle_root: None,
            masternodes,
            quorums,
        };
        list.masternode_merkle_root = list.calculate_masternodes_merkle_root();
        list.llmq_merkle_root = list.calculate_llmq_merkle_root();
        list
    }

    /// An empty list anchored at a block; the state before any diff has
    /// been applied.
    pub fn empty(block_hash: BlockHash, block_height: CoreBlockHeight) -> Self {
        Self::new(BTreeMap::new(), BTreeMap::new(), block_hash, block_height)
    }

    pub fn masternode_count(&self) -> usize {
        self.masternodes.len()
    }

    pub fn quorum_count(&self) -> usize {
        self.quorums.values().map(BTreeMap::len).sum()
    }

    /// The quorum of the given type formed at the given block, if this
    /// list carries it.
    pub fn quorum_entry_of_type_for_quorum_hash(
        &self,
        llmq_type: LLMQType,
        quorum_hash: QuorumHash,
    ) -> Option<&QualifiedQuorumEntry> {
        self.quorums.get(&llmq_type)?.get(&quorum_hash)
    }

    pub fn quorum_entry_of_type_for_quorum_hash_mut(
        &mut self,
        llmq_type: LLMQType,
        quorum_hash: QuorumHash,
    ) -> Option<&mut QualifiedQuorumEntry> {
        self.quorums.get_mut(&llmq_type)?.get_mut(&quorum_hash)
    }
}
