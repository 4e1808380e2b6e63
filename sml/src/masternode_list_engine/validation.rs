//! Quorum and chain-lock verification over committed engine state.

use hashes::{sha256d, Hash};

use crate::chain_lock::ChainLock;
use crate::consensus::Encodable;
use crate::hash_types::{BlockHash, QuorumHash};
use crate::llmq_type::LLMQType;
use crate::masternode_list_engine::{MasternodeListEngine, WORK_BLOCK_OFFSET};
use crate::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;
use crate::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use crate::quorum_entry::quorum_modifier_type::LLMQModifierType;
use crate::quorum_validation_error::QuorumValidationError;
use crate::CoreBlockHeight;

impl MasternodeListEngine {
    /// Fully validates a quorum commitment: structure, member
    /// reconstruction, then both BLS checks.
    pub fn validate_quorum(
        &self,
        quorum: &QualifiedQuorumEntry,
    ) -> Result<(), QuorumValidationError> {
        quorum.quorum_entry.validate_structure()?;
        let members = if quorum.quorum_entry.llmq_type.is_rotating_quorum_type() {
            self.find_rotated_masternodes_for_quorum(quorum)?
        } else {
            self.find_non_rotated_masternodes_for_quorum(quorum)?
        };
        quorum.validate(&members)
    }

    /// Member selection for non-rotated quorums: the scoring masternodes
    /// of the list at the quorum's work block, best `size` scores first.
    fn find_non_rotated_masternodes_for_quorum(
        &self,
        quorum: &QualifiedQuorumEntry,
    ) -> Result<Vec<&QualifiedMasternodeListEntry>, QuorumValidationError> {
        let llmq_type = quorum.quorum_entry.llmq_type;
        let quorum_block_hash =
            BlockHash::from_byte_array(quorum.quorum_entry.quorum_hash.to_byte_array());
        let quorum_height = self
            .block_heights
            .get(&quorum_block_hash)
            .copied()
            .ok_or(QuorumValidationError::RequiredBlockHeightNotPresent(quorum_block_hash))?;
        let work_height = quorum_height.saturating_sub(WORK_BLOCK_OFFSET);
        let (work_block_hash, list) = self.list_at_work_height(work_height)?;
        let modifier = self.quorum_modifier(llmq_type, work_height, work_block_hash)?;
        let mut members = list.scored_masternodes_for_quorum_modifier(modifier.build_llmq_hash());
        members.truncate(llmq_type.size());
        Ok(members)
    }

    pub(crate) fn list_at_work_height(
        &self,
        work_height: CoreBlockHeight,
    ) -> Result<(BlockHash, &crate::masternode_list::MasternodeList), QuorumValidationError> {
        let work_block_hash = self
            .block_hashes
            .get(&work_height)
            .copied()
            .ok_or(QuorumValidationError::RequiredBlockAtHeightNotPresent(work_height))?;
        let list = self
            .masternode_lists
            .get(&work_height)
            .ok_or(QuorumValidationError::RequiredMasternodeListNotPresent(work_height))?;
        Ok((work_block_hash, list))
    }

    /// The modifier masternode scores are computed against at a work
    /// block: hash-based before v20, chain-lock based from v20 on.
    pub(crate) fn quorum_modifier(
        &self,
        llmq_type: LLMQType,
        work_height: CoreBlockHeight,
        work_block_hash: BlockHash,
    ) -> Result<LLMQModifierType, QuorumValidationError> {
        if self.network.core_v20_is_active_at(work_height) {
            let signature = self
                .chain_lock_signatures
                .get(&work_block_hash)
                .copied()
                .ok_or(QuorumValidationError::RequiredChainLockNotPresent(
                    work_height,
                    work_block_hash,
                ))?;
            Ok(LLMQModifierType::CoreV20(llmq_type, work_height, signature))
        } else {
            Ok(LLMQModifierType::PreCoreV20(llmq_type, work_block_hash))
        }
    }

    /// Verifies a chain lock against the responsible quorum.
    ///
    /// The signing quorum is the active chain-lock quorum with the lowest
    /// ordering hash for the lock's request id, per DIP-8 quorum
    /// selection.
    pub fn verify_chain_lock(&self, chain_lock: &ChainLock) -> Result<(), QuorumValidationError> {
        let llmq_type = self.network.chain_locks_type();
        let request_id = chain_lock.request_id();
        let quorums = self
            .latest_masternode_list()
            .and_then(|list| list.quorums.get(&llmq_type))
            .filter(|quorums| !quorums.is_empty())
            .ok_or(QuorumValidationError::NoActiveQuorumForSigning(llmq_type))?;
        let signing_quorum = quorums
            .values()
            .min_by_key(|quorum| {
                ordering_hash(llmq_type, quorum.quorum_entry.quorum_hash, &request_id)
            })
            .ok_or(QuorumValidationError::NoActiveQuorumForSigning(llmq_type))?;
        let digest = chain_lock.sign_hash(llmq_type, signing_quorum.quorum_entry.quorum_hash);
        signing_quorum.verify_message_digest(digest, &chain_lock.signature)
    }
}

/// The DIP-8 quorum ordering hash for a signing request.
fn ordering_hash(llmq_type: LLMQType, quorum_hash: QuorumHash, request_id: &sha256d::Hash) -> [u8; 32] {
    let mut buf = Vec::with_capacity(65);
    let mut write = || -> Result<(), std::io::Error> {
        llmq_type.consensus_encode(&mut buf)?;
        quorum_hash.consensus_encode(&mut buf)?;
        buf.extend_from_slice(&request_id.to_byte_array());
        Ok(())
    };
    write().expect("in-memory writers do not error");
    sha256d::Hash::hash(&buf).to_byte_array()
}
