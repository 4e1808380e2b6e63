use hashes::{sha256d, Hash};

use crate::hash_types::{MerkleRootMasternodeList, MerkleRootQuorums};
use crate::masternode_list::MasternodeList;

/// Computes a merkle root over the given leaf hashes: pairwise sha256d per
/// level, an odd node paired with itself. `None` for an empty leaf set.
pub fn merkle_root_from_hashes(hashes: Vec<[u8; 32]>) -> Option<[u8; 32]> {
    if hashes.is_empty() {
        return None;
    }
    let mut level = hashes;
    while level.len() > 1 {
        let mut next = Vec::with_capacity((level.len() + 1) / 2);
        for pair in level.chunks(2) {
            let left = pair[0];
            let right = *pair.get(1).unwrap_or(&pair[0]);
            let mut buf = [0u8; 64];
            buf[..32].copy_from_slice(&left);
            buf[32..].copy_from_slice(&right);
            next.push(sha256d::Hash::hash(&buf).to_byte_array());
        }
        level = next;
    }
    Some(level[0])
}

impl MasternodeList {
    /// Leaf hashes of the masternode merkle tree: the entry hashes keyed
    /// by registration id in ascending byte order.
    pub fn hashes_for_merkle_root(&self) -> Vec<[u8; 32]> {
        self.masternodes
            .values()
            .map(|entry| entry.entry_hash.to_byte_array())
            .collect()
    }

    /// Leaf hashes of the quorum merkle tree: the commitment entry hashes
    /// in ascending order.
    pub fn hashes_for_quorum_merkle_root(&self) -> Vec<[u8; 32]> {
        let mut hashes: Vec<[u8; 32]> = self
            .quorums
            .values()
            .flat_map(|of_type| of_type.values().map(|entry| entry.entry_hash.to_byte_array()))
            .collect();
        hashes.sort();
        hashes
    }

    pub fn calculate_masternodes_merkle_root(&self) -> Option<MerkleRootMasternodeList> {
        merkle_root_from_hashes(self.hashes_for_merkle_root())
            .map(MerkleRootMasternodeList::from_byte_array)
    }

    pub fn calculate_llmq_merkle_root(&self) -> Option<MerkleRootQuorums> {
        merkle_root_from_hashes(self.hashes_for_quorum_merkle_root())
            .map(MerkleRootQuorums::from_byte_array)
    }
}
