use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use dash_sml::{BlockHash, CoreBlockHeight};

use crate::backup::{BackupBlockInfo, BackupDataProvider};
use crate::chain_state::{AssertedBlockRoots, ChainStateAccessor};
use crate::context::ProcessingContext;
use crate::error::ProcessDiffError;

/// Resolves block facts, preferring the embedder's chain state and
/// falling back to a backup provider when the context allows it.
///
/// Backup lookups are bounded by the context's `lookup_timeout` and race
/// against the shutdown token; neither a slow nor a failing backup can
/// wedge diff processing.
pub struct FallbackCoordinator {
    accessor: Arc<dyn ChainStateAccessor>,
    backup: Option<Arc<dyn BackupDataProvider>>,
    cancel: CancellationToken,
}

impl FallbackCoordinator {
    pub fn new(
        accessor: Arc<dyn ChainStateAccessor>,
        backup: Option<Arc<dyn BackupDataProvider>>,
        cancel: CancellationToken,
    ) -> Self {
        FallbackCoordinator {
            accessor,
            backup,
            cancel,
        }
    }

    pub fn accessor(&self) -> &dyn ChainStateAccessor {
        self.accessor.as_ref()
    }

    /// Height of a block, from the chain state or the backup.
    pub async fn resolve_height(
        &self,
        block_hash: BlockHash,
        ctx: &ProcessingContext,
    ) -> Result<CoreBlockHeight, ProcessDiffError> {
        if let Some(height) = self.accessor.height_for_block_hash(&block_hash) {
            return Ok(height);
        }
        self.backup_block_info(block_hash, ctx)
            .await
            .map(|info| info.height)
    }

    /// The coinbase-asserted roots of a block, from the chain state or
    /// the backup. A block neither source can vouch roots for is
    /// unavailable; the caller must not commit without the cross-check.
    pub async fn resolve_roots(
        &self,
        block_hash: BlockHash,
        ctx: &ProcessingContext,
    ) -> Result<AssertedBlockRoots, ProcessDiffError> {
        if let Some(roots) = self.accessor.roots_for_block_hash(&block_hash) {
            return Ok(roots);
        }
        let info = self.backup_block_info(block_hash, ctx).await?;
        info.roots
            .ok_or(ProcessDiffError::DataUnavailable { block_hash })
    }

    async fn backup_block_info(
        &self,
        block_hash: BlockHash,
        ctx: &ProcessingContext,
    ) -> Result<BackupBlockInfo, ProcessDiffError> {
        if !ctx.use_fallback_backup {
            return Err(ProcessDiffError::DataUnavailable { block_hash });
        }
        let backup = self
            .backup
            .as_ref()
            .ok_or(ProcessDiffError::DataUnavailable { block_hash })?;

        debug!(%block_hash, "block not in chain state, querying backup provider");
        tokio::select! {
            _ = self.cancel.cancelled() => Err(ProcessDiffError::Cancelled),
            outcome = tokio::time::timeout(ctx.lookup_timeout, backup.block_info(block_hash)) => {
                match outcome {
                    Ok(Ok(info)) => Ok(info),
                    Ok(Err(error)) => {
                        warn!(%block_hash, %error, "backup provider failed");
                        Err(ProcessDiffError::DataUnavailable { block_hash })
                    }
                    Err(_elapsed) => {
                        warn!(%block_hash, timeout = ?ctx.lookup_timeout, "backup provider timed out");
                        Err(ProcessDiffError::DataUnavailable { block_hash })
                    }
                }
            }
        }
    }
}
