use std::cmp::Ordering;

use crate::hash_types::{
    ConfirmedHashHashedWithProRegTx, MasternodeEntryHash, QuorumModifierHash, ScoreHash,
};
use crate::masternode_list_entry::MasternodeListEntry;

/// A masternode list entry together with the hashes derived from it.
///
/// The entry hash is the merkle leaf and the confirmed-hash digest feeds
/// score computation; both are needed every time a list is verified, so
/// they are computed once when the entry enters a list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedMasternodeListEntry {
    pub masternode_list_entry: MasternodeListEntry,
    /// The merkle leaf of this entry.
    pub entry_hash: MasternodeEntryHash,
    /// Cached digest for score computation; `None` while the registration
    /// is unconfirmed.
    pub confirmed_hash_hashed_with_pro_reg_tx: Option<ConfirmedHashHashedWithProRegTx>,
}

impl From<MasternodeListEntry> for QualifiedMasternodeListEntry {
    fn from(masternode_list_entry: MasternodeListEntry) -> Self {
        let entry_hash = masternode_list_entry.calculate_entry_hash();
        let confirmed_hash_hashed_with_pro_reg_tx = masternode_list_entry
            .confirmed_hash
            .is_set()
            .then(|| {
                ConfirmedHashHashedWithProRegTx::create(
                    masternode_list_entry.pro_reg_tx_hash,
                    masternode_list_entry.confirmed_hash,
                )
            });
        QualifiedMasternodeListEntry {
            masternode_list_entry,
            entry_hash,
            confirmed_hash_hashed_with_pro_reg_tx,
        }
    }
}

impl PartialOrd for QualifiedMasternodeListEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QualifiedMasternodeListEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.masternode_list_entry.cmp(&other.masternode_list_entry)
    }
}

impl QualifiedMasternodeListEntry {
    /// The selection score of this masternode for the given quorum
    /// modifier. Invalid or unconfirmed masternodes never score.
    pub fn score(&self, modifier: QuorumModifierHash) -> Option<ScoreHash> {
        if !self.masternode_list_entry.is_valid {
            return None;
        }
        self.confirmed_hash_hashed_with_pro_reg_tx
            .map(|cached| ScoreHash::create_score(cached, modifier))
    }
}
