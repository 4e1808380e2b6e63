use dash_sml::{BlockHash, CoreBlockHeight, MerkleRootMasternodeList, MerkleRootQuorums};

/// The two merkle roots the coinbase of a block commits to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AssertedBlockRoots {
    pub mn_list_root: MerkleRootMasternodeList,
    pub llmq_root: MerkleRootQuorums,
}

/// Read-only view into the header chain the embedder has already
/// validated.
///
/// Lookups must be cheap and non-blocking; a miss means the chain state
/// does not (yet) cover the block, not that the block is invalid. Misses
/// are routed through the [`FallbackCoordinator`](crate::fallback), never
/// silently skipped.
pub trait ChainStateAccessor: Send + Sync {
    /// Height of a block, if the header chain covers it.
    fn height_for_block_hash(&self, block_hash: &BlockHash) -> Option<CoreBlockHeight>;

    /// Hash of the block at a height on the active chain.
    fn block_hash_for_height(&self, height: CoreBlockHeight) -> Option<BlockHash>;

    /// The coinbase-asserted merkle roots of a block, where the embedder
    /// tracks them.
    fn roots_for_block_hash(&self, block_hash: &BlockHash) -> Option<AssertedBlockRoots>;
}
