use async_trait::async_trait;
use thiserror::Error;

use dash_sml::{BlockHash, CoreBlockHeight};

use crate::chain_state::AssertedBlockRoots;

/// Block facts recovered from a backup source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupBlockInfo {
    pub height: CoreBlockHeight,
    /// The coinbase-asserted roots, when the backup source exposes them.
    pub roots: Option<AssertedBlockRoots>,
}

/// A backup source failed to produce block data.
#[derive(Debug, Clone, Error)]
#[error("backup provider error: {0}")]
pub struct BackupError(pub String);

/// Secondary source of block data, consulted when the chain state misses
/// a block and the processing context allows it. Typically an explorer
/// API or a trusted node.
///
/// Implementations may take arbitrarily long; the caller bounds the wait.
#[async_trait]
pub trait BackupDataProvider: Send + Sync {
    async fn block_info(&self, block_hash: BlockHash) -> Result<BackupBlockInfo, BackupError>;
}
