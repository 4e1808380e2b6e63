use hashes::Hash;

use crate::bls_sig_utils::BLSSignature;
use crate::consensus::{Encodable, VarInt};
use crate::hash_types::{BlockHash, QuorumModifierHash};
use crate::llmq_type::LLMQType;
use crate::CoreBlockHeight;

/// Input of the quorum modifier hash.
///
/// Before the v20 hard fork the modifier commits to the quorum type and the
/// work block hash; from v20 on it commits to the type, the work height and
/// the chain-lock signature of the work block, which makes member selection
/// independent of miner-controlled hashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMQModifierType {
    PreCoreV20(LLMQType, BlockHash),
    CoreV20(LLMQType, CoreBlockHeight, BLSSignature),
}

impl LLMQModifierType {
    /// The modifier hash masternode scores are computed against.
    pub fn build_llmq_hash(&self) -> QuorumModifierHash {
        let mut buf = Vec::new();
        let mut write = || -> Result<(), std::io::Error> {
            match self {
                LLMQModifierType::PreCoreV20(llmq_type, block_hash) => {
                    VarInt(u64::from(u8::from(*llmq_type))).consensus_encode(&mut buf)?;
                    block_hash.consensus_encode(&mut buf)?;
                }
                LLMQModifierType::CoreV20(llmq_type, height, cl_signature) => {
                    VarInt(u64::from(u8::from(*llmq_type))).consensus_encode(&mut buf)?;
                    height.consensus_encode(&mut buf)?;
                    cl_signature.consensus_encode(&mut buf)?;
                }
            }
            Ok(())
        };
        write().expect("in-memory writers do not error");
        QuorumModifierHash::hash(&buf)
    }
}
