//! Member reconstruction for rotated (DIP-24) quorums.
//!
//! A rotated quorum at cycle height h is made of four quarters: three
//! recovered from the DKG participation snapshots of the cycles at h-c,
//! h-2c and h-3c, and one formed at h itself from masternodes not used by
//! the earlier quarters. Reconstruction is all-or-nothing: any missing or
//! inconsistent snapshot fails the whole quorum.

use std::collections::BTreeSet;

use hashes::Hash;

use crate::hash_types::{BlockHash, ProTxHash};
use crate::llmq_type::LLMQType;
use crate::masternode_list_engine::{MasternodeListEngine, WORK_BLOCK_OFFSET};
use crate::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;
use crate::message_qrinfo::{MNSkipListMode, QuorumSnapshot};
use crate::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use crate::quorum_validation_error::QuorumValidationError;
use crate::CoreBlockHeight;

/// Snapshot cycles contributing quarters, oldest first.
const SNAPSHOT_CYCLES_BACK: [u32; 3] = [3, 2, 1];

impl MasternodeListEngine {
    /// Reconstructs the member set of a rotated quorum from the stored
    /// snapshots, in quarter order (oldest cycle first).
    pub(crate) fn find_rotated_masternodes_for_quorum(
        &self,
        quorum: &QualifiedQuorumEntry,
    ) -> Result<Vec<&QualifiedMasternodeListEntry>, QuorumValidationError> {
        let llmq_type = quorum.quorum_entry.llmq_type;
        let params = llmq_type.params();
        let quorum_count = params.signing_active_quorum_count as usize;

        let quorum_index = quorum.quorum_entry.quorum_index.unwrap_or(0);
        if quorum_index < 0 || quorum_index as usize >= quorum_count {
            return Err(QuorumValidationError::InvalidQuorumIndex {
                index: quorum_index,
                quorum_count,
            });
        }
        let quorum_index = quorum_index as usize;

        let quorum_block_hash =
            BlockHash::from_byte_array(quorum.quorum_entry.quorum_hash.to_byte_array());
        let quorum_height = self
            .block_heights
            .get(&quorum_block_hash)
            .copied()
            .ok_or(QuorumValidationError::RequiredBlockHeightNotPresent(quorum_block_hash))?;
        let cycle_length = params.dkg_params.interval;
        let cycle_base_height = quorum_height - (quorum_height % cycle_length);

        let mut snapshot_quarters = Vec::with_capacity(SNAPSHOT_CYCLES_BACK.len());
        for cycles_back in SNAPSHOT_CYCLES_BACK {
            snapshot_quarters.push(self.snapshot_quarter_members(
                llmq_type,
                cycle_base_height,
                cycles_back,
            )?);
        }

        let used: BTreeSet<ProTxHash> = snapshot_quarters
            .iter()
            .flatten()
            .flatten()
            .map(|entry| entry.masternode_list_entry.pro_reg_tx_hash)
            .collect();
        let new_quarters = self.new_cycle_quarter_members(llmq_type, cycle_base_height, &used)?;

        let mut members = Vec::with_capacity(params.size);
        for quarters in &snapshot_quarters {
            if let Some(quarter) = quarters.get(quorum_index) {
                members.extend(quarter.iter().copied());
            }
        }
        if let Some(quarter) = new_quarters.get(quorum_index) {
            members.extend(quarter.iter().copied());
        }

        if members.len() < params.min_size {
            return Err(QuorumValidationError::InsufficientQuorumMembers {
                required: params.min_size,
                found: members.len(),
            });
        }
        Ok(members)
    }

    /// The quarters a snapshot cycle contributed, one candidate list per
    /// quorum index.
    fn snapshot_quarter_members(
        &self,
        llmq_type: LLMQType,
        cycle_base_height: CoreBlockHeight,
        cycles_back: u32,
    ) -> Result<Vec<Vec<&QualifiedMasternodeListEntry>>, QuorumValidationError> {
        let params = llmq_type.params();
        let cycle_height = cycle_base_height
            .checked_sub(cycles_back * params.dkg_params.interval)
            .ok_or(QuorumValidationError::RequiredBlockAtHeightNotPresent(0))?;
        let work_height = cycle_height.saturating_sub(WORK_BLOCK_OFFSET);
        let (work_block_hash, list) = self.list_at_work_height(work_height)?;
        let snapshot = self
            .known_snapshots
            .get(&work_block_hash)
            .ok_or(QuorumValidationError::RequiredSnapshotNotPresent(work_block_hash))?;
        let modifier = self.quorum_modifier(llmq_type, work_height, work_block_hash)?;
        let scored = list.scored_masternodes_for_quorum_modifier(modifier.build_llmq_hash());

        if snapshot.active_quorum_members.len() != scored.len() {
            return Err(QuorumValidationError::SnapshotMemberListLengthMismatch {
                expected: scored.len(),
                found: snapshot.active_quorum_members.len(),
            });
        }

        // Candidates not active in the snapshot's DKG come first, then the
        // active ones, both keeping score order.
        let mut combined = Vec::with_capacity(scored.len());
        let mut active = Vec::new();
        for (entry, is_active) in scored.into_iter().zip(&snapshot.active_quorum_members) {
            if *is_active {
                active.push(entry);
            } else {
                combined.push(entry);
            }
        }
        combined.extend(active);

        apply_skip_strategy(
            combined,
            snapshot,
            params.size / 4,
            params.signing_active_quorum_count as usize,
        )
    }

    /// The quarters formed at the cycle itself: scoring masternodes of the
    /// cycle's work list, those unused by the snapshot quarters first.
    fn new_cycle_quarter_members(
        &self,
        llmq_type: LLMQType,
        cycle_base_height: CoreBlockHeight,
        used: &BTreeSet<ProTxHash>,
    ) -> Result<Vec<Vec<&QualifiedMasternodeListEntry>>, QuorumValidationError> {
        let params = llmq_type.params();
        let work_height = cycle_base_height.saturating_sub(WORK_BLOCK_OFFSET);
        let (work_block_hash, list) = self.list_at_work_height(work_height)?;
        let modifier = self.quorum_modifier(llmq_type, work_height, work_block_hash)?;
        let scored = list.scored_masternodes_for_quorum_modifier(modifier.build_llmq_hash());

        let (used_entries, unused): (Vec<_>, Vec<_>) = scored
            .into_iter()
            .partition(|entry| used.contains(&entry.masternode_list_entry.pro_reg_tx_hash));
        let mut combined = unused;
        combined.extend(used_entries);

        let quarter_size = params.size / 4;
        let quorum_count = params.signing_active_quorum_count as usize;
        let mut quarters = vec![Vec::new(); quorum_count];
        for (i, entry) in combined
            .into_iter()
            .take(quarter_size * quorum_count)
            .enumerate()
        {
            quarters[i / quarter_size].push(entry);
        }
        Ok(quarters)
    }
}

/// Applies a snapshot's skip-list mode to the combined candidate list and
/// chunks the selected entries into per-index quarters.
fn apply_skip_strategy<'a>(
    combined: Vec<&'a QualifiedMasternodeListEntry>,
    snapshot: &QuorumSnapshot,
    quarter_size: usize,
    quorum_count: usize,
) -> Result<Vec<Vec<&'a QualifiedMasternodeListEntry>>, QuorumValidationError> {
    let member_count = combined.len();
    let check_index = |index: i64| -> Result<usize, QuorumValidationError> {
        if index < 0 || index as usize >= member_count {
            Err(QuorumValidationError::SnapshotSkipIndexOutOfRange {
                index,
                member_count,
            })
        } else {
            Ok(index as usize)
        }
    };

    let selected: Vec<&QualifiedMasternodeListEntry> = match snapshot.skip_list_mode {
        MNSkipListMode::NoSkipping => combined,
        MNSkipListMode::SkipFirst => {
            let mut skipped = BTreeSet::new();
            let mut first_entry_index: i64 = 0;
            for &index in &snapshot.skip_list {
                let absolute = if first_entry_index == 0 {
                    first_entry_index = i64::from(index);
                    i64::from(index)
                } else {
                    first_entry_index + i64::from(index)
                };
                skipped.insert(check_index(absolute)?);
            }
            combined
                .into_iter()
                .enumerate()
                .filter(|(i, _)| !skipped.contains(i))
                .map(|(_, entry)| entry)
                .collect()
        }
        MNSkipListMode::SkipExcept => {
            let mut selected = Vec::with_capacity(snapshot.skip_list.len());
            for &index in &snapshot.skip_list {
                selected.push(combined[check_index(i64::from(index))?]);
            }
            selected
        }
        MNSkipListMode::SkipAll => Vec::new(),
    };

    let mut quarters = vec![Vec::new(); quorum_count];
    for (i, entry) in selected
        .into_iter()
        .take(quarter_size * quorum_count)
        .enumerate()
    {
        quarters[i / quarter_size].push(entry);
    }
    Ok(quarters)
}
