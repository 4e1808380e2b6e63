//! LLMQ type identifiers and their consensus parameters.

use std::fmt;
use std::io::{Read, Write};

use crate::consensus::{encode, Decodable, Encodable};

/// DKG session parameters of a quorum type. Only the interval participates
/// in list verification (it defines rotation cycle boundaries); the phase
/// lengths are retained for completeness of the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DKGParams {
    /// Blocks between DKG session starts.
    pub interval: u32,
    /// Blocks per DKG phase.
    pub phase_blocks: u32,
}

pub const DKG_TEST: DKGParams = DKGParams {
    interval: 24,
    phase_blocks: 2,
};

pub const DKG_DEVNET: DKGParams = DKGParams {
    interval: 24,
    phase_blocks: 2,
};

pub const DKG_TEST_DIP0024: DKGParams = DKGParams {
    interval: 24,
    phase_blocks: 2,
};

pub const DKG_DEVNET_DIP0024: DKGParams = DKGParams {
    interval: 48,
    phase_blocks: 2,
};

pub const DKG_50_60: DKGParams = DKGParams {
    interval: 24,
    phase_blocks: 2,
};

pub const DKG_60_75: DKGParams = DKGParams {
    interval: 288,
    phase_blocks: 2,
};

pub const DKG_400_60: DKGParams = DKGParams {
    interval: 288,
    phase_blocks: 4,
};

pub const DKG_400_85: DKGParams = DKGParams {
    interval: 576,
    phase_blocks: 4,
};

pub const DKG_100_67: DKGParams = DKGParams {
    interval: 24,
    phase_blocks: 2,
};

/// Consensus parameters of a quorum type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LLMQParams {
    pub quorum_type: LLMQType,
    pub name: &'static str,
    /// Number of members in a full quorum.
    pub size: usize,
    /// Minimum number of valid members for the quorum to function.
    pub min_size: usize,
    /// Minimum number of commitment signers.
    pub threshold: usize,
    pub dkg_params: DKGParams,
    /// Number of quorums of this type kept active for signing.
    pub signing_active_quorum_count: u32,
}

pub const LLMQ_TEST: LLMQParams = LLMQParams {
    quorum_type: LLMQType::LlmqtypeTest,
    name: "llmq_test",
    size: 4,
    min_size: 2,
    threshold: 2,
    dkg_params: DKG_TEST,
    signing_active_quorum_count: 2,
};

pub const LLMQ_DEVNET: LLMQParams = LLMQParams {
    quorum_type: LLMQType::LlmqtypeDevnet,
    name: "llmq_devnet",
    size: 12,
    min_size: 7,
    threshold: 7,
    dkg_params: DKG_DEVNET,
    signing_active_quorum_count: 4,
};

pub const LLMQ_TEST_DIP0024: LLMQParams = LLMQParams {
    quorum_type: LLMQType::LlmqtypeTestDIP0024,
    name: "llmq_test_dip0024",
    size: 4,
    min_size: 2,
    threshold: 2,
    dkg_params: DKG_TEST_DIP0024,
    signing_active_quorum_count: 2,
};

pub const LLMQ_DEVNET_DIP0024: LLMQParams = LLMQParams {
    quorum_type: LLMQType::LlmqtypeDevnetDIP0024,
    name: "llmq_devnet_dip0024",
    size: 8,
    min_size: 4,
    threshold: 4,
    dkg_params: DKG_DEVNET_DIP0024,
    signing_active_quorum_count: 2,
};

pub const LLMQ_50_60: LLMQParams = LLMQParams {
    quorum_type: LLMQType::Llmqtype50_60,
    name: "llmq_50_60",
    size: 50,
    min_size: 40,
    threshold: 30,
    dkg_params: DKG_50_60,
    signing_active_quorum_count: 24,
};

pub const LLMQ_60_75: LLMQParams = LLMQParams {
    quorum_type: LLMQType::Llmqtype60_75,
    name: "llmq_60_75",
    size: 60,
    min_size: 50,
    threshold: 45,
    dkg_params: DKG_60_75,
    signing_active_quorum_count: 32,
};

pub const LLMQ_400_60: LLMQParams = LLMQParams {
    quorum_type: LLMQType::Llmqtype400_60,
    name: "llmq_400_60",
    size: 400,
    min_size: 300,
    threshold: 240,
    dkg_params: DKG_400_60,
    signing_active_quorum_count: 4,
};

pub const LLMQ_400_85: LLMQParams = LLMQParams {
    quorum_type: LLMQType::Llmqtype400_85,
    name: "llmq_400_85",
    size: 400,
    min_size: 350,
    threshold: 340,
    dkg_params: DKG_400_85,
    signing_active_quorum_count: 4,
};

pub const LLMQ_100_67: LLMQParams = LLMQParams {
    quorum_type: LLMQType::Llmqtype100_67,
    name: "llmq_100_67",
    size: 100,
    min_size: 80,
    threshold: 67,
    dkg_params: DKG_100_67,
    signing_active_quorum_count: 24,
};

pub const LLMQ_25_67: LLMQParams = LLMQParams {
    quorum_type: LLMQType::Llmqtype25_67,
    name: "llmq_25_67",
    size: 25,
    min_size: 22,
    threshold: 17,
    dkg_params: DKG_100_67,
    signing_active_quorum_count: 24,
};

/// The registered long-living masternode quorum types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum LLMQType {
    Llmqtype50_60 = 1,
    Llmqtype400_60 = 2,
    Llmqtype400_85 = 3,
    Llmqtype100_67 = 4,
    Llmqtype60_75 = 5,
    Llmqtype25_67 = 6,
    LlmqtypeTest = 100,
    LlmqtypeDevnet = 101,
    LlmqtypeTestDIP0024 = 105,
    LlmqtypeDevnetDIP0024 = 106,
    /// An id the engine does not recognize; kept so unknown quorum types
    /// decode and pass through without validation.
    LlmqtypeUnknown = 255,
}

impl LLMQType {
    /// The consensus parameters of this type. Unknown ids fall back to the
    /// devnet parameters, matching how such quorums are treated when they
    /// appear on a devnet.
    pub fn params(&self) -> LLMQParams {
        match self {
            LLMQType::Llmqtype50_60 => LLMQ_50_60,
            LLMQType::Llmqtype400_60 => LLMQ_400_60,
            LLMQType::Llmqtype400_85 => LLMQ_400_85,
            LLMQType::Llmqtype100_67 => LLMQ_100_67,
            LLMQType::Llmqtype60_75 => LLMQ_60_75,
            LLMQType::Llmqtype25_67 => LLMQ_25_67,
            LLMQType::LlmqtypeTest => LLMQ_TEST,
            LLMQType::LlmqtypeDevnet => LLMQ_DEVNET,
            LLMQType::LlmqtypeTestDIP0024 => LLMQ_TEST_DIP0024,
            LLMQType::LlmqtypeDevnetDIP0024 => LLMQ_DEVNET_DIP0024,
            LLMQType::LlmqtypeUnknown => LLMQ_DEVNET,
        }
    }

    pub fn size(&self) -> usize {
        self.params().size
    }

    pub fn threshold(&self) -> usize {
        self.params().threshold
    }

    /// Whether members of this quorum type are selected by DIP-24 rotation
    /// rather than a plain score ordering.
    pub fn is_rotating_quorum_type(&self) -> bool {
        matches!(
            self,
            LLMQType::Llmqtype60_75
                | LLMQType::LlmqtypeTestDIP0024
                | LLMQType::LlmqtypeDevnetDIP0024
        )
    }
}

impl From<u8> for LLMQType {
    fn from(value: u8) -> Self {
        match value {
            1 => LLMQType::Llmqtype50_60,
            2 => LLMQType::Llmqtype400_60,
            3 => LLMQType::Llmqtype400_85,
            4 => LLMQType::Llmqtype100_67,
            5 => LLMQType::Llmqtype60_75,
            6 => LLMQType::Llmqtype25_67,
            100 => LLMQType::LlmqtypeTest,
            101 => LLMQType::LlmqtypeDevnet,
            105 => LLMQType::LlmqtypeTestDIP0024,
            106 => LLMQType::LlmqtypeDevnetDIP0024,
            _ => LLMQType::LlmqtypeUnknown,
        }
    }
}

impl From<LLMQType> for u8 {
    fn from(value: LLMQType) -> Self {
        match value {
            LLMQType::Llmqtype50_60 => 1,
            LLMQType::Llmqtype400_60 => 2,
            LLMQType::Llmqtype400_85 => 3,
            LLMQType::Llmqtype100_67 => 4,
            LLMQType::Llmqtype60_75 => 5,
            LLMQType::Llmqtype25_67 => 6,
            LLMQType::LlmqtypeTest => 100,
            LLMQType::LlmqtypeDevnet => 101,
            LLMQType::LlmqtypeTestDIP0024 => 105,
            LLMQType::LlmqtypeDevnetDIP0024 => 106,
            LLMQType::LlmqtypeUnknown => 255,
        }
    }
}

impl fmt::Display for LLMQType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.params().name)
    }
}

impl Encodable for LLMQType {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        u8::from(*self).consensus_encode(writer)
    }
}

impl Decodable for LLMQType {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        Ok(LLMQType::from(u8::consensus_decode(reader)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u8_mapping_round_trips() {
        for id in [1u8, 2, 3, 4, 5, 6, 100, 101, 105, 106] {
            let llmq_type = LLMQType::from(id);
            assert_eq!(u8::from(llmq_type), id);
        }
        assert_eq!(LLMQType::from(42), LLMQType::LlmqtypeUnknown);
    }

    #[test]
    fn rotation_flag_matches_dip24_types() {
        assert!(LLMQType::Llmqtype60_75.is_rotating_quorum_type());
        assert!(LLMQType::LlmqtypeTestDIP0024.is_rotating_quorum_type());
        assert!(!LLMQType::Llmqtype50_60.is_rotating_quorum_type());
    }

    #[test]
    fn thresholds_never_exceed_sizes() {
        for llmq_type in [
            LLMQType::Llmqtype50_60,
            LLMQType::Llmqtype400_60,
            LLMQType::Llmqtype400_85,
            LLMQType::Llmqtype100_67,
            LLMQType::Llmqtype60_75,
            LLMQType::Llmqtype25_67,
            LLMQType::LlmqtypeTest,
            LLMQType::LlmqtypeDevnet,
        ] {
            let params = llmq_type.params();
            assert!(params.threshold <= params.min_size);
            assert!(params.min_size <= params.size);
        }
    }
}
