use std::fmt;
use std::str::FromStr;

use crate::hash_types::BlockHash;
use crate::llmq_type::LLMQType;
use crate::CoreBlockHeight;

/// The chain a masternode list engine is tracking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Network {
    /// Mainnet.
    Dash,
    /// Public testnet.
    Testnet,
    /// A named development network.
    Devnet,
    /// Local regression test network.
    Regtest,
}

impl Network {
    /// The genesis block hash, where one is fixed by the chain definition.
    /// Devnets derive their genesis from the devnet name, so none is known
    /// statically.
    pub fn known_genesis_block_hash(&self) -> Option<BlockHash> {
        match self {
            Network::Dash => Some(genesis_hash(
                "00000ffd590b1485b3caadc19b22e6379c733355108f107a430458cdf3407ab6",
            )),
            Network::Testnet => Some(genesis_hash(
                "00000bafbc94add76cb75e2ec92894837288a481e5c005f6563d91623bf8bc2c",
            )),
            Network::Devnet | Network::Regtest => None,
        }
    }

    /// Whether the v20 hard fork (chain-lock based quorum modifiers) is
    /// active at the given height.
    pub fn core_v20_is_active_at(&self, height: CoreBlockHeight) -> bool {
        match self {
            Network::Dash => height >= 1_987_776,
            Network::Testnet => height >= 905_100,
            Network::Devnet | Network::Regtest => true,
        }
    }

    /// The quorum type that signs chain locks on this network.
    pub fn chain_locks_type(&self) -> LLMQType {
        match self {
            Network::Dash => LLMQType::Llmqtype400_60,
            Network::Testnet => LLMQType::Llmqtype50_60,
            Network::Devnet => LLMQType::LlmqtypeDevnet,
            Network::Regtest => LLMQType::LlmqtypeTest,
        }
    }

}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Dash => "dash",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Regtest => "regtest",
        };
        write!(f, "{name}")
    }
}

fn genesis_hash(hex: &str) -> BlockHash {
    BlockHash::from_str(hex).expect("chain definition constants are valid hashes")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genesis_hashes_known_for_fixed_chains() {
        assert!(Network::Dash.known_genesis_block_hash().is_some());
        assert!(Network::Testnet.known_genesis_block_hash().is_some());
        assert!(Network::Devnet.known_genesis_block_hash().is_none());
    }

    #[test]
    fn v20_activation_heights() {
        assert!(!Network::Dash.core_v20_is_active_at(1_987_775));
        assert!(Network::Dash.core_v20_is_active_at(1_987_776));
        assert!(Network::Regtest.core_v20_is_active_at(0));
    }
}
