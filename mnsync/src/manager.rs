use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use dash_sml::chain_lock::ChainLock;
use dash_sml::consensus::deserialize;
use dash_sml::masternode_list_engine::CLSignatureStatus;
use dash_sml::message_qrinfo::{QRInfo, QuorumSnapshot};
use dash_sml::message_sml::MnListDiff;
use dash_sml::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use dash_sml::{
    BlockHash, CoreBlockHeight, LLMQType, MasternodeList, MasternodeListEngine, Network,
    QuorumHash, SmlError, WORK_BLOCK_OFFSET,
};

use crate::backup::BackupDataProvider;
use crate::chain_state::ChainStateAccessor;
use crate::context::ProcessingContext;
use crate::error::ProcessDiffError;
use crate::fallback::FallbackCoordinator;

/// Async front of the verification engine.
///
/// Wraps a [`MasternodeListEngine`] and drives network payloads into it:
/// block heights and coinbase roots are resolved through the
/// [`FallbackCoordinator`] before the engine is touched, and every apply
/// for the chain runs under a single async lock so diffs commit in the
/// order they arrive. Reads never wait on an in-flight apply.
pub struct MasternodeListManager {
    network: Network,
    engine: RwLock<MasternodeListEngine>,
    fallback: FallbackCoordinator,
    /// Serializes applies. Held across the awaits that resolve block
    /// data so two diffs can never interleave their reconstruction.
    apply_lock: Mutex<()>,
    cancel: CancellationToken,
}

impl MasternodeListManager {
    pub fn new(
        network: Network,
        accessor: Arc<dyn ChainStateAccessor>,
        backup: Option<Arc<dyn BackupDataProvider>>,
    ) -> Self {
        Self::with_engine(MasternodeListEngine::new(network), accessor, backup)
    }

    /// Wraps an engine restored from persisted state.
    pub fn with_engine(
        engine: MasternodeListEngine,
        accessor: Arc<dyn ChainStateAccessor>,
        backup: Option<Arc<dyn BackupDataProvider>>,
    ) -> Self {
        let cancel = CancellationToken::new();
        MasternodeListManager {
            network: engine.network,
            engine: RwLock::new(engine),
            fallback: FallbackCoordinator::new(accessor, backup, cancel.clone()),
            apply_lock: Mutex::new(()),
            cancel,
        }
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Aborts in-flight and future applies.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }

    /// Decodes and applies a raw payload, dispatching on the context's
    /// wire format flag: `qrinfo` when `is_rotating_quorum_format` is
    /// set, `mnlistdiff` otherwise.
    pub async fn apply_raw_payload(
        &self,
        payload: &[u8],
        ctx: &ProcessingContext,
    ) -> Result<BlockHash, ProcessDiffError> {
        if ctx.is_rotating_quorum_format {
            let qr_info: QRInfo = deserialize(payload)?;
            self.apply_qr_info(qr_info, ctx).await
        } else {
            let diff: MnListDiff = deserialize(payload)?;
            self.apply_diff(diff, ctx).await
        }
    }

    /// Applies a masternode list diff and commits the resulting list.
    ///
    /// The diff's end height and coinbase-asserted roots are resolved
    /// first; a root that disagrees with the diff, or that no source can
    /// vouch for, rejects the payload before any reconstruction. Quorum
    /// commitments are BLS-verified unless the payload is
    /// snapshot-sourced.
    pub async fn apply_diff(
        &self,
        diff: MnListDiff,
        ctx: &ProcessingContext,
    ) -> Result<BlockHash, ProcessDiffError> {
        let _guard = self.apply_lock.lock().await;
        self.apply_diff_locked(diff, ctx, !ctx.is_snapshot_sourced)
            .await
    }

    /// Applies a full rotation info payload: the historical diffs and
    /// snapshots first (oldest to newest), then the cycle diff at `h` and
    /// the tip diff. Returns the tip's committed block hash.
    pub async fn apply_qr_info(
        &self,
        qr_info: QRInfo,
        ctx: &ProcessingContext,
    ) -> Result<BlockHash, ProcessDiffError> {
        let _guard = self.apply_lock.lock().await;

        let QRInfo {
            quorum_snapshot_at_h_minus_c,
            quorum_snapshot_at_h_minus_2c,
            quorum_snapshot_at_h_minus_3c,
            mn_list_diff_tip,
            mn_list_diff_at_h,
            mn_list_diff_at_h_minus_c,
            mn_list_diff_at_h_minus_2c,
            mn_list_diff_at_h_minus_3c,
            extra_share,
            ..
        } = qr_info;

        // Snapshot-bearing pairs oldest first, so each cycle's member
        // list is committed before a later cycle needs it.
        let mut pairs: Vec<(Option<QuorumSnapshot>, MnListDiff, bool)> = Vec::with_capacity(7);
        if let Some((snapshot, diff)) = extra_share {
            pairs.push((Some(snapshot), diff, false));
        }
        pairs.push((
            Some(quorum_snapshot_at_h_minus_3c),
            mn_list_diff_at_h_minus_3c,
            false,
        ));
        pairs.push((
            Some(quorum_snapshot_at_h_minus_2c),
            mn_list_diff_at_h_minus_2c,
            false,
        ));
        pairs.push((
            Some(quorum_snapshot_at_h_minus_c),
            mn_list_diff_at_h_minus_c,
            false,
        ));
        let verify = !ctx.is_snapshot_sourced;
        pairs.push((None, mn_list_diff_at_h, verify));
        pairs.push((None, mn_list_diff_tip, verify));

        let mut committed = None;
        for (snapshot, diff, verify_quorums) in pairs {
            if let Some(snapshot) = snapshot {
                let cycle_height = self.fallback.resolve_height(diff.block_hash, ctx).await?;
                self.feed_snapshot_for_cycle(cycle_height, snapshot);
            }
            committed = Some(self.apply_diff_locked(diff, ctx, verify_quorums).await?);
        }
        committed.ok_or_else(|| {
            ProcessDiffError::Internal("rotation info carried no diffs".to_string())
        })
    }

    /// Verifies a chain-lock signature against the active signing quorum
    /// and records it. The signature is stored unverified when no signing
    /// quorum is known yet; a signature that an active quorum rejects is
    /// an error and is not stored.
    pub fn save_cl_signature(
        &self,
        chain_lock: &ChainLock,
    ) -> Result<CLSignatureStatus, ProcessDiffError> {
        let mut engine = self.engine_write();
        match engine.verify_chain_lock(chain_lock) {
            Ok(()) => {
                debug!(block_hash = %chain_lock.block_hash, height = chain_lock.block_height,
                    "chain lock verified");
            }
            Err(error) if error.is_missing_context() => {
                debug!(block_hash = %chain_lock.block_hash, %error,
                    "storing chain lock signature unverified");
            }
            Err(dash_sml::QuorumValidationError::NoActiveQuorumForSigning(llmq_type)) => {
                debug!(block_hash = %chain_lock.block_hash, %llmq_type,
                    "no signing quorum yet, storing chain lock signature unverified");
            }
            Err(error) => return Err(ProcessDiffError::QuorumSignatureInvalid(error)),
        }

        let status = engine
            .chain_lock_signatures
            .save(chain_lock.block_hash, chain_lock.signature);
        if let CLSignatureStatus::Conflicted { existing } = &status {
            warn!(block_hash = %chain_lock.block_hash, %existing, offered = %chain_lock.signature,
                "conflicting chain lock signature rejected");
        }
        Ok(status)
    }

    /// Records a block hash/height pair in the engine's index.
    pub fn feed_block_hash(&self, height: CoreBlockHeight, block_hash: BlockHash) {
        self.engine_write().feed_block_hash(height, block_hash);
    }

    pub fn latest_list(&self) -> Option<MasternodeList> {
        self.engine_read().latest_masternode_list().cloned()
    }

    pub fn list_at_height(&self, height: CoreBlockHeight) -> Option<MasternodeList> {
        self.engine_read().masternode_list_at_height(height).cloned()
    }

    /// The most recent committed list at or before the given block.
    pub fn list_for_block_hash(&self, block_hash: &BlockHash) -> Option<MasternodeList> {
        self.engine_read()
            .masternode_list_for_block_hash(block_hash)
            .cloned()
    }

    pub fn quorum(
        &self,
        llmq_type: LLMQType,
        quorum_hash: QuorumHash,
    ) -> Option<QualifiedQuorumEntry> {
        self.engine_read().quorum(llmq_type, quorum_hash).cloned()
    }

    /// Number of committed lists.
    pub fn list_count(&self) -> usize {
        self.engine_read().masternode_lists.len()
    }

    /// Caller must hold `apply_lock`. All block data is resolved before
    /// the engine write lock is taken, so reads only ever block on the
    /// final commit.
    async fn apply_diff_locked(
        &self,
        diff: MnListDiff,
        ctx: &ProcessingContext,
        verify_quorums: bool,
    ) -> Result<BlockHash, ProcessDiffError> {
        if self.cancel.is_cancelled() {
            return Err(ProcessDiffError::Cancelled);
        }

        let block_hash = diff.block_hash;
        let height = self.fallback.resolve_height(block_hash, ctx).await?;

        let roots = self.fallback.resolve_roots(block_hash, ctx).await?;
        if roots.mn_list_root != diff.merkle_root_mn_list {
            return Err(ProcessDiffError::MerkleMismatch(
                SmlError::MasternodeMerkleRootMismatch {
                    expected: roots.mn_list_root,
                    calculated: diff.merkle_root_mn_list,
                },
            ));
        }
        if roots.llmq_root != diff.merkle_root_llmq_list {
            return Err(ProcessDiffError::MerkleMismatch(
                SmlError::QuorumMerkleRootMismatch {
                    expected: roots.llmq_root,
                    calculated: diff.merkle_root_llmq_list,
                },
            ));
        }

        let masternode_count;
        let quorum_count;
        {
            let mut engine = self.engine_write();
            engine.apply_diff(diff, height, verify_quorums)?;
            let list = engine
                .masternode_list_at_height(height)
                .ok_or_else(|| {
                    ProcessDiffError::Internal("committed list missing after apply".to_string())
                })?;
            masternode_count = list.masternode_count();
            quorum_count = list.quorum_count();
        }
        info!(
            network = %self.network,
            height,
            %block_hash,
            masternodes = masternode_count,
            quorums = quorum_count,
            peer = ?ctx.peer,
            "masternode list committed"
        );
        Ok(block_hash)
    }

    /// Keys a rotation snapshot by its cycle's work block, resolving the
    /// work block hash through the chain state or the engine's own index.
    /// An unresolvable work block leaves the snapshot unfed; quorums that
    /// need it are later skipped as missing context rather than failed.
    fn feed_snapshot_for_cycle(&self, cycle_height: CoreBlockHeight, snapshot: QuorumSnapshot) {
        let work_height = cycle_height.saturating_sub(WORK_BLOCK_OFFSET);
        let mut engine = self.engine_write();
        let work_block_hash = self
            .fallback
            .accessor()
            .block_hash_for_height(work_height)
            .or_else(|| engine.block_hashes.get(&work_height).copied());
        match work_block_hash {
            Some(work_block_hash) => {
                engine.feed_block_hash(work_height, work_block_hash);
                engine.feed_snapshot(work_block_hash, snapshot);
            }
            None => {
                warn!(cycle_height, work_height, "work block unknown, snapshot not stored");
            }
        }
    }

    fn engine_read(&self) -> RwLockReadGuard<'_, MasternodeListEngine> {
        self.engine.read().expect("engine lock poisoned")
    }

    fn engine_write(&self) -> RwLockWriteGuard<'_, MasternodeListEngine> {
        self.engine.write().expect("engine lock poisoned")
    }
}
