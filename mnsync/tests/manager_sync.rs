//! End-to-end manager scenarios over mocked chain state and backup
//! providers.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use hashes::Hash;
use tokio::time::sleep;

use dash_mnsync::backup::{BackupBlockInfo, BackupDataProvider, BackupError};
use dash_mnsync::chain_state::{AssertedBlockRoots, ChainStateAccessor};
use dash_mnsync::{MasternodeListManager, ProcessDiffError, ProcessingContext};
use dash_sml::address::ServiceAddress;
use dash_sml::bls_sig_utils::{BLSPublicKey, BLSSignature};
use dash_sml::chain_lock::ChainLock;
use dash_sml::consensus::serialize;
use dash_sml::hash_types::{MerkleRootMasternodeList, MerkleRootQuorums, QuorumVVecHash};
use dash_sml::llmq_entry_verification::{
    LLMQEntryVerificationSkipStatus, LLMQEntryVerificationStatus,
};
use dash_sml::masternode_list::MasternodeList;
use dash_sml::masternode_list_engine::CLSignatureStatus;
use dash_sml::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;
use dash_sml::masternode_list_entry::{MasternodeListEntry, MasternodeType};
use dash_sml::message_qrinfo::{MNSkipListMode, QRInfo, QuorumSnapshot};
use dash_sml::message_sml::{MnListDiff, QuorumCLSigObject};
use dash_sml::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use dash_sml::quorum_entry::QuorumEntry;
use dash_sml::{
    BlockHash, ConfirmedHash, CoreBlockHeight, LLMQType, Network, ProTxHash, QuorumHash,
};

#[derive(Default)]
struct MockChainState {
    by_hash: HashMap<BlockHash, CoreBlockHeight>,
    by_height: HashMap<CoreBlockHeight, BlockHash>,
    roots: HashMap<BlockHash, AssertedBlockRoots>,
}

impl MockChainState {
    fn insert_block(&mut self, height: CoreBlockHeight, block_hash: BlockHash) {
        self.by_hash.insert(block_hash, height);
        self.by_height.insert(height, block_hash);
    }

    fn insert_roots(&mut self, block_hash: BlockHash, roots: AssertedBlockRoots) {
        self.roots.insert(block_hash, roots);
    }
}

impl ChainStateAccessor for MockChainState {
    fn height_for_block_hash(&self, block_hash: &BlockHash) -> Option<CoreBlockHeight> {
        self.by_hash.get(block_hash).copied()
    }

    fn block_hash_for_height(&self, height: CoreBlockHeight) -> Option<BlockHash> {
        self.by_height.get(&height).copied()
    }

    fn roots_for_block_hash(&self, block_hash: &BlockHash) -> Option<AssertedBlockRoots> {
        self.roots.get(block_hash).copied()
    }
}

struct MockBackup {
    blocks: HashMap<BlockHash, BackupBlockInfo>,
    delay: Duration,
}

#[async_trait]
impl BackupDataProvider for MockBackup {
    async fn block_info(&self, block_hash: BlockHash) -> Result<BackupBlockInfo, BackupError> {
        sleep(self.delay).await;
        self.blocks
            .get(&block_hash)
            .copied()
            .ok_or_else(|| BackupError(format!("unknown block {block_hash}")))
    }
}

fn entry(tag: &[u8]) -> MasternodeListEntry {
    MasternodeListEntry {
        version: 1,
        pro_reg_tx_hash: ProTxHash::hash(tag),
        confirmed_hash: ConfirmedHash::hash(tag),
        service_address: ServiceAddress {
            ip: std::net::Ipv4Addr::new(10, 1, 1, 1),
            port: 19999,
        },
        operator_public_key: BLSPublicKey::from([7u8; 48]),
        key_id_voting: [0u8; 20],
        is_valid: true,
        mn_type: MasternodeType::Regular,
        update_height: 0,
    }
}

fn default_entries() -> Vec<MasternodeListEntry> {
    vec![entry(b"alpha"), entry(b"beta"), entry(b"gamma")]
}

/// The committed list a diff with these entries and quorums must produce,
/// used to derive the asserted roots.
fn list_of(
    entries: &[MasternodeListEntry],
    quorums: &[QuorumEntry],
    height: CoreBlockHeight,
) -> MasternodeList {
    let mut masternodes = BTreeMap::new();
    for entry in entries {
        let mut entry = entry.clone();
        entry.update_height = height;
        masternodes.insert(
            entry.pro_reg_tx_hash,
            QualifiedMasternodeListEntry::from(entry),
        );
    }
    let mut quorum_map: BTreeMap<LLMQType, BTreeMap<QuorumHash, QualifiedQuorumEntry>> =
        BTreeMap::new();
    for quorum in quorums {
        quorum_map
            .entry(quorum.llmq_type)
            .or_default()
            .insert(quorum.quorum_hash, QualifiedQuorumEntry::from(quorum.clone()));
    }
    MasternodeList::new(masternodes, quorum_map, BlockHash::hash(b"scratch"), height)
}

fn roots_of(diff: &MnListDiff) -> AssertedBlockRoots {
    AssertedBlockRoots {
        mn_list_root: diff.merkle_root_mn_list,
        llmq_root: diff.merkle_root_llmq_list,
    }
}

fn bootstrap_diff(height: CoreBlockHeight, block_hash: BlockHash) -> MnListDiff {
    diff_with_quorums(height, block_hash, vec![])
}

fn diff_with_quorums(
    height: CoreBlockHeight,
    block_hash: BlockHash,
    new_quorums: Vec<QuorumEntry>,
) -> MnListDiff {
    let entries = default_entries();
    let list = list_of(&entries, &new_quorums, height);
    MnListDiff {
        version: 1,
        base_block_hash: BlockHash::all_zeros(),
        block_hash,
        merkle_root_mn_list: list
            .masternode_merkle_root
            .unwrap_or_else(MerkleRootMasternodeList::all_zeros),
        merkle_root_llmq_list: list
            .llmq_merkle_root
            .unwrap_or_else(MerkleRootQuorums::all_zeros),
        deleted_masternodes: vec![],
        new_masternodes: entries,
        deleted_quorums: vec![],
        new_quorums,
        quorums_chainlock_signatures: vec![],
    }
}

fn test_quorum(quorum_hash: QuorumHash) -> QuorumEntry {
    QuorumEntry {
        version: 1,
        llmq_type: LLMQType::LlmqtypeTest,
        quorum_hash,
        quorum_index: None,
        signers: vec![true; 4],
        valid_members: vec![true; 4],
        quorum_public_key: BLSPublicKey::from([4u8; 48]),
        quorum_vvec_hash: QuorumVVecHash::hash(b"vvec"),
        threshold_sig: BLSSignature::from([5u8; 96]),
        all_commitment_aggregated_signature: BLSSignature::from([6u8; 96]),
    }
}

fn manager_with(chain: MockChainState, backup: Option<MockBackup>) -> MasternodeListManager {
    MasternodeListManager::new(
        Network::Regtest,
        Arc::new(chain),
        backup.map(|backup| Arc::new(backup) as Arc<dyn BackupDataProvider>),
    )
}

fn ctx() -> ProcessingContext {
    ProcessingContext::for_network(Network::Regtest)
}

#[tokio::test]
async fn bootstrap_commits_through_chain_state() {
    let block_hash = BlockHash::hash(b"block 100");
    let diff = bootstrap_diff(100, block_hash);
    let mut chain = MockChainState::default();
    chain.insert_block(100, block_hash);
    chain.insert_roots(block_hash, roots_of(&diff));
    let manager = manager_with(chain, None);

    let committed = manager.apply_diff(diff, &ctx()).await.unwrap();
    assert_eq!(committed, block_hash);
    let list = manager.latest_list().unwrap();
    assert_eq!(list.known_height, 100);
    assert_eq!(list.masternode_count(), 3);
}

#[tokio::test]
async fn unknown_block_without_backup_is_transient() {
    let manager = manager_with(MockChainState::default(), None);
    let block_hash = BlockHash::hash(b"nowhere");

    let err = manager
        .apply_diff(bootstrap_diff(100, block_hash), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessDiffError::DataUnavailable { .. }));
    assert!(err.is_transient());
    assert!(!err.peer_fault());
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn missing_roots_are_unavailable_not_unchecked() {
    // The chain state knows the height but tracks no roots for the block
    // and there is no backup: the diff must not commit on its own say-so.
    let block_hash = BlockHash::hash(b"block 100");
    let mut chain = MockChainState::default();
    chain.insert_block(100, block_hash);
    let manager = manager_with(chain, None);

    let err = manager
        .apply_diff(bootstrap_diff(100, block_hash), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessDiffError::DataUnavailable { .. }));
    assert!(err.is_transient());
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn backup_provider_resolves_height_and_roots() {
    let block_hash = BlockHash::hash(b"backup only");
    let diff = bootstrap_diff(100, block_hash);
    let mut blocks = HashMap::new();
    blocks.insert(
        block_hash,
        BackupBlockInfo {
            height: 100,
            roots: Some(roots_of(&diff)),
        },
    );
    let manager = manager_with(
        MockChainState::default(),
        Some(MockBackup {
            blocks,
            delay: Duration::from_millis(20),
        }),
    );

    let committed = manager
        .apply_diff(diff, &ctx().with_fallback_backup())
        .await
        .unwrap();
    assert_eq!(committed, block_hash);
    assert_eq!(manager.list_count(), 1);
}

#[tokio::test]
async fn backup_supplied_roots_still_gate_the_diff() {
    let block_hash = BlockHash::hash(b"backup only");
    let mut blocks = HashMap::new();
    blocks.insert(
        block_hash,
        BackupBlockInfo {
            height: 100,
            roots: Some(AssertedBlockRoots {
                mn_list_root: MerkleRootMasternodeList::hash(b"some other list"),
                llmq_root: MerkleRootQuorums::all_zeros(),
            }),
        },
    );
    let manager = manager_with(
        MockChainState::default(),
        Some(MockBackup {
            blocks,
            delay: Duration::from_millis(20),
        }),
    );

    let err = manager
        .apply_diff(
            bootstrap_diff(100, block_hash),
            &ctx().with_fallback_backup(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessDiffError::MerkleMismatch(_)));
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn backup_without_roots_is_unavailable() {
    let block_hash = BlockHash::hash(b"rootless backup");
    let mut blocks = HashMap::new();
    blocks.insert(
        block_hash,
        BackupBlockInfo {
            height: 100,
            roots: None,
        },
    );
    let manager = manager_with(
        MockChainState::default(),
        Some(MockBackup {
            blocks,
            delay: Duration::from_millis(20),
        }),
    );

    let err = manager
        .apply_diff(
            bootstrap_diff(100, block_hash),
            &ctx().with_fallback_backup(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessDiffError::DataUnavailable { .. }));
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn slow_backup_is_bounded_by_lookup_timeout() {
    let block_hash = BlockHash::hash(b"slow backup");
    let diff = bootstrap_diff(100, block_hash);
    let mut blocks = HashMap::new();
    blocks.insert(
        block_hash,
        BackupBlockInfo {
            height: 100,
            roots: Some(roots_of(&diff)),
        },
    );
    let manager = manager_with(
        MockChainState::default(),
        Some(MockBackup {
            blocks,
            delay: Duration::from_millis(500),
        }),
    );
    let ctx = ctx()
        .with_fallback_backup()
        .with_lookup_timeout(Duration::from_millis(20));

    let err = manager.apply_diff(diff, &ctx).await.unwrap_err();
    assert!(matches!(err, ProcessDiffError::DataUnavailable { .. }));
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn asserted_root_mismatch_rejects_payload() {
    let block_hash = BlockHash::hash(b"block 100");
    let mut chain = MockChainState::default();
    chain.insert_block(100, block_hash);
    chain.insert_roots(
        block_hash,
        AssertedBlockRoots {
            mn_list_root: MerkleRootMasternodeList::hash(b"some other list"),
            llmq_root: MerkleRootQuorums::all_zeros(),
        },
    );
    let manager = manager_with(chain, None);

    let err = manager
        .apply_diff(bootstrap_diff(100, block_hash), &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessDiffError::MerkleMismatch(_)));
    assert!(err.peer_fault());
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn base_mismatch_leaves_committed_state_untouched() {
    let block_100 = BlockHash::hash(b"block 100");
    let block_101 = BlockHash::hash(b"block 101");
    let bootstrap = bootstrap_diff(100, block_100);
    let mut orphan = bootstrap_diff(101, block_101);
    orphan.base_block_hash = BlockHash::hash(b"unknown base");
    let mut chain = MockChainState::default();
    chain.insert_block(100, block_100);
    chain.insert_block(101, block_101);
    chain.insert_roots(block_100, roots_of(&bootstrap));
    chain.insert_roots(block_101, roots_of(&orphan));
    let manager = manager_with(chain, None);

    manager.apply_diff(bootstrap, &ctx()).await.unwrap();

    let err = manager.apply_diff(orphan, &ctx()).await.unwrap_err();
    assert!(matches!(
        err,
        ProcessDiffError::BaseMismatch { expected: None, .. }
    ));
    assert_eq!(manager.list_count(), 1);
    assert_eq!(manager.latest_list().unwrap().known_height, 100);
}

#[tokio::test]
async fn incremental_diff_removes_masternode() {
    let block_100 = BlockHash::hash(b"block 100");
    let block_101 = BlockHash::hash(b"block 101");
    let bootstrap = bootstrap_diff(100, block_100);

    let remaining = vec![entry(b"alpha"), entry(b"gamma")];
    let next = MnListDiff {
        version: 1,
        base_block_hash: block_100,
        block_hash: block_101,
        merkle_root_mn_list: list_of(&remaining, &[], 100)
            .masternode_merkle_root
            .unwrap(),
        merkle_root_llmq_list: MerkleRootQuorums::all_zeros(),
        deleted_masternodes: vec![ProTxHash::hash(b"beta")],
        new_masternodes: vec![],
        deleted_quorums: vec![],
        new_quorums: vec![],
        quorums_chainlock_signatures: vec![],
    };

    let mut chain = MockChainState::default();
    chain.insert_block(100, block_100);
    chain.insert_block(101, block_101);
    chain.insert_roots(block_100, roots_of(&bootstrap));
    chain.insert_roots(block_101, roots_of(&next));
    let manager = manager_with(chain, None);

    manager.apply_diff(bootstrap, &ctx()).await.unwrap();
    manager.apply_diff(next, &ctx()).await.unwrap();

    let latest = manager.latest_list().unwrap();
    assert_eq!(latest.known_height, 101);
    assert_eq!(latest.masternode_count(), 2);
    assert!(!latest.masternodes.contains_key(&ProTxHash::hash(b"beta")));
}

#[tokio::test]
async fn raw_payload_round_trips_and_garbage_is_malformed() {
    let block_hash = BlockHash::hash(b"block 100");
    let diff = bootstrap_diff(100, block_hash);
    let mut chain = MockChainState::default();
    chain.insert_block(100, block_hash);
    chain.insert_roots(block_hash, roots_of(&diff));
    let manager = manager_with(chain, None);

    let payload = serialize(&diff);
    let committed = manager.apply_raw_payload(&payload, &ctx()).await.unwrap();
    assert_eq!(committed, block_hash);

    let err = manager
        .apply_raw_payload(&payload[..payload.len() / 2], &ctx())
        .await
        .unwrap_err();
    assert!(matches!(err, ProcessDiffError::MalformedMessage(_)));
    assert_eq!(err.category(), "message");
}

#[tokio::test]
async fn qr_info_payload_commits_all_cycles_oldest_first() {
    // h = 148, cycle length 24; the tip diff ends at 150. Every diff here
    // bootstraps from the zero hash so each cycle commits independently.
    let heights = [76u32, 100, 124, 148, 150];
    let mut chain = MockChainState::default();
    let mut diffs = Vec::new();
    for height in heights {
        let block_hash = BlockHash::hash(&height.to_le_bytes());
        let diff = bootstrap_diff(height, block_hash);
        chain.insert_block(height, block_hash);
        chain.insert_roots(block_hash, roots_of(&diff));
        diffs.push(diff);
    }
    // Work blocks for the three snapshot cycles.
    for work_height in [68u32, 92, 116] {
        chain.insert_block(work_height, BlockHash::hash(&work_height.to_le_bytes()));
    }
    let snapshot = || QuorumSnapshot {
        skip_list_mode: MNSkipListMode::NoSkipping,
        active_quorum_members: vec![true; 3],
        skip_list: vec![],
    };
    let [diff_h3c, diff_h2c, diff_hc, diff_h, diff_tip]: [MnListDiff; 5] =
        diffs.try_into().unwrap();
    let qr_info = QRInfo {
        quorum_snapshot_at_h_minus_c: snapshot(),
        quorum_snapshot_at_h_minus_2c: snapshot(),
        quorum_snapshot_at_h_minus_3c: snapshot(),
        mn_list_diff_tip: diff_tip,
        mn_list_diff_at_h: diff_h,
        mn_list_diff_at_h_minus_c: diff_hc,
        mn_list_diff_at_h_minus_2c: diff_h2c,
        mn_list_diff_at_h_minus_3c: diff_h3c,
        extra_share: None,
        last_commitment_per_index: vec![],
        quorum_snapshot_list: vec![],
        mn_list_diff_list: vec![],
    };
    let manager = manager_with(chain, None);

    let committed = manager
        .apply_raw_payload(&serialize(&qr_info), &ctx().rotating_quorum_format())
        .await
        .unwrap();
    assert_eq!(committed, BlockHash::hash(&150u32.to_le_bytes()));
    assert_eq!(manager.list_count(), 5);
    assert_eq!(manager.latest_list().unwrap().known_height, 150);
}

#[tokio::test]
async fn snapshot_sourced_payload_defers_quorum_verification() {
    let quorum_hash = QuorumHash::hash(b"unresolved quorum block");
    let block_hash = BlockHash::hash(b"block 100");
    let diff = diff_with_quorums(100, block_hash, vec![test_quorum(quorum_hash)]);
    let mut chain = MockChainState::default();
    chain.insert_block(100, block_hash);
    chain.insert_roots(block_hash, roots_of(&diff));
    let manager = manager_with(chain, None);

    manager
        .apply_diff(diff.clone(), &ctx().snapshot_sourced())
        .await
        .unwrap();
    let quorum = manager
        .quorum(LLMQType::LlmqtypeTest, quorum_hash)
        .unwrap();
    assert_eq!(
        quorum.verified,
        LLMQEntryVerificationStatus::Skipped(
            LLMQEntryVerificationSkipStatus::NotMarkedForVerification
        )
    );

    // The same payload from the network goes through verification, which
    // here can only be skipped for missing context.
    let mut chain = MockChainState::default();
    chain.insert_block(100, block_hash);
    chain.insert_roots(block_hash, roots_of(&diff));
    let network_manager = manager_with(chain, None);
    network_manager.apply_diff(diff, &ctx()).await.unwrap();
    let quorum = network_manager
        .quorum(LLMQType::LlmqtypeTest, quorum_hash)
        .unwrap();
    assert!(matches!(
        quorum.verified,
        LLMQEntryVerificationStatus::Skipped(LLMQEntryVerificationSkipStatus::MissingContext(_))
    ));
}

#[tokio::test]
async fn conflicting_quorum_chain_lock_signature_rejects_diff() {
    let quorum_block = BlockHash::hash(b"quorum block");
    let quorum_hash = QuorumHash::from_byte_array(quorum_block.to_byte_array());
    let work_block = BlockHash::hash(b"work block");
    let block_hash = BlockHash::hash(b"block 200");

    let mut diff = diff_with_quorums(200, block_hash, vec![test_quorum(quorum_hash)]);
    diff.quorums_chainlock_signatures = vec![QuorumCLSigObject {
        signature: BLSSignature::from([8u8; 96]),
        index_set: vec![0],
    }];

    let mut chain = MockChainState::default();
    chain.insert_block(200, block_hash);
    chain.insert_roots(block_hash, roots_of(&diff));
    let manager = manager_with(chain, None);
    manager.feed_block_hash(120, quorum_block);
    manager.feed_block_hash(112, work_block);

    // A different signature already locks the quorum's work block.
    let existing = ChainLock {
        block_height: 112,
        block_hash: work_block,
        signature: BLSSignature::from([9u8; 96]),
    };
    assert_eq!(
        manager.save_cl_signature(&existing).unwrap(),
        CLSignatureStatus::Inserted
    );

    let err = manager.apply_diff(diff, &ctx()).await.unwrap_err();
    assert!(matches!(err, ProcessDiffError::ChainLockConflict { .. }));
    assert!(err.peer_fault());
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn shutdown_cancels_pending_backup_wait() {
    let block_hash = BlockHash::hash(b"never arrives");
    let mut blocks = HashMap::new();
    blocks.insert(
        block_hash,
        BackupBlockInfo {
            height: 100,
            roots: None,
        },
    );
    let manager = Arc::new(manager_with(
        MockChainState::default(),
        Some(MockBackup {
            blocks,
            delay: Duration::from_secs(30),
        }),
    ));

    let task = {
        let manager = Arc::clone(&manager);
        tokio::spawn(async move {
            manager
                .apply_diff(
                    bootstrap_diff(100, block_hash),
                    &ctx().with_fallback_backup(),
                )
                .await
        })
    };
    sleep(Duration::from_millis(50)).await;
    manager.shutdown();

    let err = task.await.unwrap().unwrap_err();
    assert!(matches!(err, ProcessDiffError::Cancelled));
    assert_eq!(manager.list_count(), 0);
}

#[tokio::test]
async fn chain_lock_signature_insert_confirm_conflict() {
    let manager = manager_with(MockChainState::default(), None);
    let lock = ChainLock {
        block_height: 500,
        block_hash: BlockHash::hash(b"locked block"),
        signature: BLSSignature::from([1u8; 96]),
    };

    // No signing quorum yet, stored unverified.
    assert_eq!(
        manager.save_cl_signature(&lock).unwrap(),
        CLSignatureStatus::Inserted
    );
    assert_eq!(
        manager.save_cl_signature(&lock).unwrap(),
        CLSignatureStatus::Confirmed
    );

    let mut conflicting = lock.clone();
    conflicting.signature = BLSSignature::from([2u8; 96]);
    assert_eq!(
        manager.save_cl_signature(&conflicting).unwrap(),
        CLSignatureStatus::Conflicted {
            existing: lock.signature
        }
    );
}
