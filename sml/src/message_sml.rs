//! The `mnlistdiff` P2P payload.

use std::io::{Read, Write};

use crate::bls_sig_utils::BLSSignature;
use crate::consensus::{encode, Decodable, Encodable, VarInt};
use crate::error::SmlError;
use crate::hash_types::{BlockHash, MerkleRootMasternodeList, MerkleRootQuorums, ProTxHash, QuorumHash};
use crate::llmq_type::LLMQType;
use crate::masternode_list_entry::MasternodeListEntry;
use crate::quorum_entry::QuorumEntry;

/// A quorum deleted by a diff, identified by type and hash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedQuorum {
    pub llmq_type: LLMQType,
    pub quorum_hash: QuorumHash,
}

impl_consensus_encoding!(DeletedQuorum, llmq_type, quorum_hash);

/// A chain-lock signature shared by a set of new quorums, referenced by
/// their position in `new_quorums`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumCLSigObject {
    pub signature: BLSSignature,
    pub index_set: Vec<u16>,
}

impl_consensus_encoding!(QuorumCLSigObject, signature, index_set);

/// The delta between the masternode lists at two block heights.
///
/// The two merkle roots are the ones the coinbase of the target block
/// commits to; a list reconstructed from this diff must reproduce them
/// exactly. The wire payload also carries a partial merkle proof of the
/// coinbase transaction; it is consumed during decode but not retained,
/// since the asserted roots are checked against the chain state instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MnListDiff {
    pub version: u16,
    pub base_block_hash: BlockHash,
    pub block_hash: BlockHash,
    pub merkle_root_mn_list: MerkleRootMasternodeList,
    pub merkle_root_llmq_list: MerkleRootQuorums,
    pub deleted_masternodes: Vec<ProTxHash>,
    pub new_masternodes: Vec<MasternodeListEntry>,
    pub deleted_quorums: Vec<DeletedQuorum>,
    pub new_quorums: Vec<QuorumEntry>,
    pub quorums_chainlock_signatures: Vec<QuorumCLSigObject>,
}

impl Encodable for MnListDiff {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = self.version.consensus_encode(writer)?;
        len += self.base_block_hash.consensus_encode(writer)?;
        len += self.block_hash.consensus_encode(writer)?;
        // Empty coinbase proof: one transaction, no hashes, no flags.
        len += 1u32.consensus_encode(writer)?;
        len += VarInt(0).consensus_encode(writer)?;
        len += VarInt(0).consensus_encode(writer)?;
        len += self.merkle_root_mn_list.consensus_encode(writer)?;
        len += self.merkle_root_llmq_list.consensus_encode(writer)?;
        len += self.deleted_masternodes.consensus_encode(writer)?;
        len += self.new_masternodes.consensus_encode(writer)?;
        len += self.deleted_quorums.consensus_encode(writer)?;
        len += self.new_quorums.consensus_encode(writer)?;
        len += self.quorums_chainlock_signatures.consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for MnListDiff {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let version = u16::consensus_decode(reader)?;
        let base_block_hash = BlockHash::consensus_decode(reader)?;
        let block_hash = BlockHash::consensus_decode(reader)?;
        // Coinbase proof section, consumed but not retained.
        let _total_transactions = u32::consensus_decode(reader)?;
        let _merkle_hashes = Vec::<[u8; 32]>::consensus_decode(reader)?;
        let _merkle_flags = Vec::<u8>::consensus_decode(reader)?;
        let merkle_root_mn_list = MerkleRootMasternodeList::consensus_decode(reader)?;
        let merkle_root_llmq_list = MerkleRootQuorums::consensus_decode(reader)?;
        let deleted_masternodes = Vec::<ProTxHash>::consensus_decode(reader)?;
        let new_masternodes = Vec::<MasternodeListEntry>::consensus_decode(reader)?;
        let deleted_quorums = Vec::<DeletedQuorum>::consensus_decode(reader)?;
        let new_quorums = Vec::<QuorumEntry>::consensus_decode(reader)?;
        let quorums_chainlock_signatures = Vec::<QuorumCLSigObject>::consensus_decode(reader)?;
        Ok(MnListDiff {
            version,
            base_block_hash,
            block_hash,
            merkle_root_mn_list,
            merkle_root_llmq_list,
            deleted_masternodes,
            new_masternodes,
            deleted_quorums,
            new_quorums,
            quorums_chainlock_signatures,
        })
    }
}

impl MnListDiff {
    /// Resolves the per-quorum chain-lock signatures into one optional
    /// signature per new quorum, in `new_quorums` order. An index pointing
    /// outside `new_quorums` makes the whole diff invalid.
    pub fn chain_lock_signature_per_new_quorum(
        &self,
    ) -> Result<Vec<Option<BLSSignature>>, SmlError> {
        let mut per_quorum = vec![None; self.new_quorums.len()];
        for set in &self.quorums_chainlock_signatures {
            for index in &set.index_set {
                let slot = per_quorum
                    .get_mut(*index as usize)
                    .ok_or(SmlError::InvalidIndexInSignatureSet(*index))?;
                *slot = Some(set.signature);
            }
        }
        Ok(per_quorum)
    }
}
