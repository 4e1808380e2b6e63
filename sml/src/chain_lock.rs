//! Chain locks (DIP-8).

use hashes::{sha256d, Hash};

use crate::bls_sig_utils::BLSSignature;
use crate::consensus::{Encodable, VarInt};
use crate::hash_types::{BlockHash, QuorumHash};
use crate::llmq_type::LLMQType;
use crate::CoreBlockHeight;

const CLSIG_REQUEST_ID_PREFIX: &[u8] = b"clsig";

/// A chain lock: the active chain-lock quorum's threshold signature over a
/// block at a given height.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainLock {
    pub block_height: CoreBlockHeight,
    pub block_hash: BlockHash,
    pub signature: BLSSignature,
}

impl_consensus_encoding!(ChainLock, block_height, block_hash, signature);

impl ChainLock {
    /// The signing request id, which selects the responsible quorum:
    /// sha256d of the "clsig" tag and the height.
    pub fn request_id(&self) -> sha256d::Hash {
        let mut buf = Vec::with_capacity(CLSIG_REQUEST_ID_PREFIX.len() + 5);
        let mut write = || -> Result<(), std::io::Error> {
            VarInt(CLSIG_REQUEST_ID_PREFIX.len() as u64).consensus_encode(&mut buf)?;
            buf.extend_from_slice(CLSIG_REQUEST_ID_PREFIX);
            self.block_height.consensus_encode(&mut buf)?;
            Ok(())
        };
        write().expect("in-memory writers do not error");
        sha256d::Hash::hash(&buf)
    }

    /// The digest the quorum signed: sha256d over the quorum type, quorum
    /// hash, request id and block hash.
    pub fn sign_hash(&self, llmq_type: LLMQType, quorum_hash: QuorumHash) -> [u8; 32] {
        let mut buf = Vec::with_capacity(97);
        let mut write = || -> Result<(), std::io::Error> {
            llmq_type.consensus_encode(&mut buf)?;
            quorum_hash.consensus_encode(&mut buf)?;
            buf.extend_from_slice(&self.request_id().to_byte_array());
            self.block_hash.consensus_encode(&mut buf)?;
            Ok(())
        };
        write().expect("in-memory writers do not error");
        sha256d::Hash::hash(&buf).to_byte_array()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::{deserialize, serialize};

    #[test]
    fn round_trip() {
        let chain_lock = ChainLock {
            block_height: 1_200_000,
            block_hash: BlockHash::hash(b"locked"),
            signature: BLSSignature::from([3u8; 96]),
        };
        let encoded = serialize(&chain_lock);
        assert_eq!(encoded.len(), 4 + 32 + 96);
        let decoded: ChainLock = deserialize(&encoded).unwrap();
        assert_eq!(decoded, chain_lock);
    }

    #[test]
    fn request_id_depends_on_height_only() {
        let a = ChainLock {
            block_height: 5,
            block_hash: BlockHash::hash(b"a"),
            signature: BLSSignature::from([0u8; 96]),
        };
        let mut b = a.clone();
        b.block_hash = BlockHash::hash(b"b");
        assert_eq!(a.request_id(), b.request_id());
        b.block_height = 6;
        assert_ne!(a.request_id(), b.request_id());
    }
}
