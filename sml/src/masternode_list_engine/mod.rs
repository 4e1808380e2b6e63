//! The committed-list engine.
//!
//! Owns every verified masternode list, the block hash/height index they
//! are keyed under, the rotation snapshots and the chain-lock signature
//! store. `apply_diff` is the only way a list enters the engine: the
//! candidate is reconstructed, its merkle roots checked and its new
//! quorums verified before anything is committed, so a failed diff leaves
//! the engine exactly as it was.

mod chain_lock_store;
mod rotation;
mod validation;

pub use chain_lock_store::{CLSignatureStatus, ChainLockSignatureStore};

use std::collections::BTreeMap;

use hashes::Hash;

use crate::error::SmlError;
use crate::hash_types::{BlockHash, MerkleRootMasternodeList, MerkleRootQuorums, QuorumHash};
use crate::llmq_entry_verification::{LLMQEntryVerificationSkipStatus, LLMQEntryVerificationStatus};
use crate::llmq_type::LLMQType;
use crate::masternode_list::MasternodeList;
use crate::message_qrinfo::QuorumSnapshot;
use crate::message_sml::MnListDiff;
use crate::network::Network;
use crate::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use crate::CoreBlockHeight;

/// Offset between a quorum's defining block and the work block its
/// modifier and member selection are computed at.
pub const WORK_BLOCK_OFFSET: CoreBlockHeight = 8;

#[derive(Debug, Clone)]
pub struct MasternodeListEngine {
    /// Block hash by height for every block the engine has been told
    /// about.
    pub block_hashes: BTreeMap<CoreBlockHeight, BlockHash>,
    /// Height by block hash, the inverse of `block_hashes`.
    pub block_heights: BTreeMap<BlockHash, CoreBlockHeight>,
    /// Committed lists by height.
    pub masternode_lists: BTreeMap<CoreBlockHeight, MasternodeList>,
    /// Rotation snapshots keyed by the work block of their cycle.
    pub known_snapshots: BTreeMap<BlockHash, QuorumSnapshot>,
    /// Chain-lock signatures keyed by the block they lock.
    pub chain_lock_signatures: ChainLockSignatureStore,
    pub network: Network,
}

impl MasternodeListEngine {
    pub fn new(network: Network) -> Self {
        MasternodeListEngine {
            block_hashes: BTreeMap::new(),
            block_heights: BTreeMap::new(),
            masternode_lists: BTreeMap::new(),
            known_snapshots: BTreeMap::new(),
            chain_lock_signatures: ChainLockSignatureStore::default(),
            network,
        }
    }

    /// Bootstraps an engine from a diff based on the zero hash or the
    /// network's genesis block.
    pub fn initialize_with_diff_to_height(
        diff: MnListDiff,
        diff_end_height: CoreBlockHeight,
        network: Network,
    ) -> Result<Self, SmlError> {
        let mut engine = Self::new(network);
        if !engine.is_bootstrap_base(diff.base_block_hash) {
            return Err(SmlError::BaseBlockNotGenesis(diff.base_block_hash));
        }
        engine.apply_diff(diff, diff_end_height, true)?;
        Ok(engine)
    }

    /// Records a block hash/height pair, extending the index the engine
    /// resolves quorum work blocks through.
    pub fn feed_block_hash(&mut self, height: CoreBlockHeight, block_hash: BlockHash) {
        self.block_hashes.insert(height, block_hash);
        self.block_heights.insert(block_hash, height);
    }

    /// Stores a rotation snapshot keyed by its cycle work block.
    pub fn feed_snapshot(&mut self, work_block_hash: BlockHash, snapshot: QuorumSnapshot) {
        self.known_snapshots.insert(work_block_hash, snapshot);
    }

    pub fn latest_masternode_list(&self) -> Option<&MasternodeList> {
        self.masternode_lists.values().next_back()
    }

    pub fn masternode_list_at_height(&self, height: CoreBlockHeight) -> Option<&MasternodeList> {
        self.masternode_lists.get(&height)
    }

    /// The most recent committed list at or before the given block. A
    /// block the engine knows the height of but holds no list at resolves
    /// to the preceding committed list.
    pub fn masternode_list_for_block_hash(&self, block_hash: &BlockHash) -> Option<&MasternodeList> {
        let height = *self.block_heights.get(block_hash)?;
        self.masternode_lists
            .range(..=height)
            .next_back()
            .map(|(_, list)| list)
    }

    /// Finds a quorum by type and hash, searching committed lists newest
    /// first.
    pub fn quorum(
        &self,
        llmq_type: LLMQType,
        quorum_hash: QuorumHash,
    ) -> Option<&QualifiedQuorumEntry> {
        self.masternode_lists
            .values()
            .rev()
            .find_map(|list| list.quorum_entry_of_type_for_quorum_hash(llmq_type, quorum_hash))
    }

    fn is_bootstrap_base(&self, base_block_hash: BlockHash) -> bool {
        base_block_hash == BlockHash::all_zeros()
            || Some(base_block_hash) == self.network.known_genesis_block_hash()
    }

    /// Applies a diff: reconstructs the candidate list, checks its merkle
    /// roots against the diff's asserted roots, verifies the new quorum
    /// commitments and commits the result. On any error the committed
    /// state is left untouched.
    ///
    /// A diff based on the zero hash or the genesis block bootstraps the
    /// first list. Returns the committed block hash.
    pub fn apply_diff(
        &mut self,
        diff: MnListDiff,
        diff_end_height: CoreBlockHeight,
        verify_quorums: bool,
    ) -> Result<BlockHash, SmlError> {
        let block_hash = diff.block_hash;
        let base_block_hash = diff.base_block_hash;
        let asserted_mn_root = diff.merkle_root_mn_list;
        let asserted_llmq_root = diff.merkle_root_llmq_list;
        let new_quorum_keys: Vec<(LLMQType, QuorumHash)> = diff
            .new_quorums
            .iter()
            .map(|entry| (entry.llmq_type, entry.quorum_hash))
            .collect();
        let cl_signatures = diff.chain_lock_signature_per_new_quorum()?;

        let bootstrap_base;
        let base_list = if self.is_bootstrap_base(base_block_hash) {
            bootstrap_base =
                MasternodeList::empty(base_block_hash, diff_end_height.saturating_sub(1));
            &bootstrap_base
        } else {
            let base_height = self
                .block_heights
                .get(&base_block_hash)
                .copied()
                .ok_or(SmlError::MissingStartMasternodeList(base_block_hash))?;
            self.masternode_lists
                .get(&base_height)
                .ok_or(SmlError::MissingStartMasternodeList(base_block_hash))?
        };

        let mut candidate = base_list.apply_diff(diff, diff_end_height)?;

        let calculated_mn_root = candidate
            .masternode_merkle_root
            .unwrap_or_else(MerkleRootMasternodeList::all_zeros);
        if calculated_mn_root != asserted_mn_root {
            return Err(SmlError::MasternodeMerkleRootMismatch {
                expected: asserted_mn_root,
                calculated: calculated_mn_root,
            });
        }
        let calculated_llmq_root = candidate
            .llmq_merkle_root
            .unwrap_or_else(MerkleRootQuorums::all_zeros);
        if calculated_llmq_root != asserted_llmq_root {
            return Err(SmlError::QuorumMerkleRootMismatch {
                expected: asserted_llmq_root,
                calculated: calculated_llmq_root,
            });
        }

        self.store_quorum_chain_lock_signatures(&new_quorum_keys, &cl_signatures)?;

        if verify_quorums {
            let mut statuses = Vec::with_capacity(new_quorum_keys.len());
            for (llmq_type, quorum_hash) in &new_quorum_keys {
                let Some(quorum) =
                    candidate.quorum_entry_of_type_for_quorum_hash(*llmq_type, *quorum_hash)
                else {
                    continue;
                };
                let status = match self.validate_quorum(quorum) {
                    Ok(()) => LLMQEntryVerificationStatus::Verified,
                    Err(error) if error.is_missing_context() => LLMQEntryVerificationStatus::Skipped(
                        LLMQEntryVerificationSkipStatus::MissingContext(error),
                    ),
                    Err(error) => return Err(SmlError::QuorumValidation(error)),
                };
                statuses.push((*llmq_type, *quorum_hash, status));
            }
            for (llmq_type, quorum_hash, status) in statuses {
                if let Some(quorum) =
                    candidate.quorum_entry_of_type_for_quorum_hash_mut(llmq_type, quorum_hash)
                {
                    quorum.verified = status;
                }
            }
        } else {
            for (llmq_type, quorum_hash) in &new_quorum_keys {
                if let Some(quorum) =
                    candidate.quorum_entry_of_type_for_quorum_hash_mut(*llmq_type, *quorum_hash)
                {
                    quorum.verified = LLMQEntryVerificationStatus::Skipped(
                        LLMQEntryVerificationSkipStatus::NotMarkedForVerification,
                    );
                }
            }
        }

        self.feed_block_hash(diff_end_height, block_hash);
        self.masternode_lists.insert(diff_end_height, candidate);
        Ok(block_hash)
    }

    /// Routes the chain-lock signatures a diff carries for its new quorums
    /// into the store, keyed by each quorum's work block. Signatures whose
    /// work block cannot be resolved yet are dropped; a conflict with a
    /// stored signature rejects the diff.
    ///
    /// This runs before quorum verification so the same diff's v20
    /// modifiers can resolve the signatures, which means they persist even
    /// when the diff is later rejected. The store never replaces an entry,
    /// so an early store cannot corrupt committed state.
    fn store_quorum_chain_lock_signatures(
        &mut self,
        new_quorum_keys: &[(LLMQType, QuorumHash)],
        cl_signatures: &[Option<crate::bls_sig_utils::BLSSignature>],
    ) -> Result<(), SmlError> {
        for ((_, quorum_hash), signature) in new_quorum_keys.iter().zip(cl_signatures) {
            let Some(signature) = signature else {
                continue;
            };
            let quorum_block_hash = BlockHash::from_byte_array(quorum_hash.to_byte_array());
            let Some(quorum_height) = self.block_heights.get(&quorum_block_hash).copied() else {
                continue;
            };
            let work_height = quorum_height.saturating_sub(WORK_BLOCK_OFFSET);
            let Some(work_block_hash) = self.block_hashes.get(&work_height).copied() else {
                continue;
            };
            if let CLSignatureStatus::Conflicted { existing } =
                self.chain_lock_signatures.save(work_block_hash, *signature)
            {
                return Err(SmlError::ChainLockConflict {
                    block_hash: work_block_hash,
                    existing,
                    offered: *signature,
                });
            }
        }
        Ok(())
    }
}
