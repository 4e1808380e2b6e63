//! Simplified masternode list (SML) verification core.
//!
//! This crate implements the trust-minimized data model a Dash light client
//! needs to track the masternode set without running a full node: decoding
//! `mnlistdiff` / `qrinfo` payloads, reconstructing list snapshots by
//! applying diffs, recomputing and checking the coinbase-asserted merkle
//! roots, validating LLMQ commitments with BLS signature checks (including
//! rotating quorums reconstructed from quorum snapshots), and keeping an
//! append-only chain-lock signature store.
//!
//! Everything here is synchronous and I/O free. The async driver that feeds
//! network payloads into the engine lives in the companion `dash-mnsync`
//! crate.

#[macro_use]
mod internal_macros;

pub mod address;
pub mod bls_sig_utils;
pub mod chain_lock;
pub mod consensus;
pub mod error;
pub mod hash_types;
pub mod llmq_entry_verification;
pub mod llmq_type;
pub mod masternode_list;
pub mod masternode_list_engine;
pub mod masternode_list_entry;
pub mod message_qrinfo;
pub mod message_sml;
pub mod network;
pub mod quorum_entry;
pub mod quorum_validation_error;

pub use crate::error::SmlError;
pub use crate::hash_types::{
    BlockHash, ConfirmedHash, MerkleRootMasternodeList, MerkleRootQuorums, ProTxHash, QuorumHash,
};
pub use crate::llmq_type::LLMQType;
pub use crate::masternode_list::MasternodeList;
pub use crate::masternode_list_engine::{MasternodeListEngine, WORK_BLOCK_OFFSET};
pub use crate::network::Network;
pub use crate::quorum_validation_error::QuorumValidationError;

/// Height of a block on the core chain.
pub type CoreBlockHeight = u32;
