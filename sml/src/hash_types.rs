//! Domain hash types.
//!
//! Every hash the engine works with is double SHA-256; the newtypes keep
//! block hashes, registration ids, merkle roots and scores from being mixed
//! up at compile time.

use hashes::{hash_newtype, sha256d, Hash};

hash_newtype! {
    /// A dash block hash.
    pub struct BlockHash(sha256d::Hash);
    /// Hash of the registration transaction that created a masternode, the
    /// stable identity of the masternode.
    pub struct ProTxHash(sha256d::Hash);
    /// Hash of the block at which a quorum's DKG started; identifies the
    /// quorum together with its LLMQ type.
    pub struct QuorumHash(sha256d::Hash);
    /// Hash of the quorum verification vector.
    pub struct QuorumVVecHash(sha256d::Hash);
    /// Hash of a serialized quorum commitment entry, the quorum's leaf in
    /// the quorum merkle tree.
    pub struct QuorumEntryHash(sha256d::Hash);
    /// The commitment hash quorum members sign.
    pub struct QuorumCommitmentHash(sha256d::Hash);
    /// Hash of a serialized masternode list entry, the masternode's leaf in
    /// the masternode merkle tree.
    pub struct MasternodeEntryHash(sha256d::Hash);
    /// Merkle root over the masternode list entries.
    pub struct MerkleRootMasternodeList(sha256d::Hash);
    /// Merkle root over the active quorum commitments.
    pub struct MerkleRootQuorums(sha256d::Hash);
    /// The per-quorum modifier masternode scores are derived from.
    pub struct QuorumModifierHash(sha256d::Hash);
    /// A masternode's score for a given quorum modifier; orders candidates
    /// during quorum member selection.
    pub struct ScoreHash(sha256d::Hash);
    /// Hash of the block in which a masternode's registration was confirmed.
    pub struct ConfirmedHash(sha256d::Hash);
    /// The confirmed hash hashed together with the registration id; cached
    /// because scores are recomputed for every quorum.
    pub struct ConfirmedHashHashedWithProRegTx(sha256d::Hash);
}

impl_hashencode!(BlockHash);
impl_hashencode!(ProTxHash);
impl_hashencode!(QuorumHash);
impl_hashencode!(QuorumVVecHash);
impl_hashencode!(QuorumEntryHash);
impl_hashencode!(QuorumCommitmentHash);
impl_hashencode!(MasternodeEntryHash);
impl_hashencode!(MerkleRootMasternodeList);
impl_hashencode!(MerkleRootQuorums);
impl_hashencode!(ConfirmedHash);

impl ConfirmedHash {
    /// Whether the hash carries a real confirmation (an all-zero hash on the
    /// wire means the registration is not yet confirmed).
    pub fn is_set(&self) -> bool {
        self.to_byte_array() != [0u8; 32]
    }
}

impl ScoreHash {
    /// Computes a masternode's selection score for a quorum modifier.
    ///
    /// Scores hash the cached confirmed-hash/registration-id digest together
    /// with the modifier; masternodes without a confirmation have no score.
    pub fn create_score(
        confirmed_hash_hashed_with_pro_reg_tx: ConfirmedHashHashedWithProRegTx,
        modifier: QuorumModifierHash,
    ) -> Self {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(confirmed_hash_hashed_with_pro_reg_tx.as_byte_array());
        buf[32..].copy_from_slice(modifier.as_byte_array());
        ScoreHash::hash(&buf)
    }
}

impl ConfirmedHashHashedWithProRegTx {
    /// Hashes a masternode's registration id together with its confirmed
    /// hash.
    pub fn create(pro_reg_tx_hash: ProTxHash, confirmed_hash: ConfirmedHash) -> Self {
        let mut buf = [0u8; 64];
        buf[..32].copy_from_slice(pro_reg_tx_hash.as_byte_array());
        buf[32..].copy_from_slice(confirmed_hash.as_byte_array());
        ConfirmedHashHashedWithProRegTx::hash(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{deserialize, serialize};

    #[test]
    fn block_hash_codec_is_raw_bytes() {
        let hash = BlockHash::hash(b"block");
        let encoded = serialize(&hash);
        assert_eq!(encoded, hash.to_byte_array());
        let decoded: BlockHash = deserialize(&encoded).unwrap();
        assert_eq!(decoded, hash);
    }

    #[test]
    fn confirmed_hash_zero_is_unset() {
        assert!(!ConfirmedHash::from_byte_array([0u8; 32]).is_set());
        assert!(ConfirmedHash::hash(b"confirmed").is_set());
    }

    #[test]
    fn scores_differ_per_modifier() {
        let cached = ConfirmedHashHashedWithProRegTx::create(
            ProTxHash::hash(b"mn"),
            ConfirmedHash::hash(b"confirmed"),
        );
        let a = ScoreHash::create_score(cached, QuorumModifierHash::hash(b"m1"));
        let b = ScoreHash::create_score(cached, QuorumModifierHash::hash(b"m2"));
        assert_ne!(a, b);
    }
}
