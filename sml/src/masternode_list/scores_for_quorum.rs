use std::collections::BTreeMap;

use crate::hash_types::{QuorumModifierHash, ScoreHash};
use crate::masternode_list::MasternodeList;
use crate::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;

/// Orders masternodes by their score for a quorum modifier, highest first.
/// Entries without a score (invalid or unconfirmed) are left out.
pub fn masternodes_by_score_descending<'a, I>(
    masternodes: I,
    modifier: QuorumModifierHash,
) -> Vec<&'a QualifiedMasternodeListEntry>
where
    I: IntoIterator<Item = &'a QualifiedMasternodeListEntry>,
{
    let mut scored: BTreeMap<ScoreHash, &'a QualifiedMasternodeListEntry> = BTreeMap::new();
    for entry in masternodes {
        if let Some(score) = entry.score(modifier) {
            scored.insert(score, entry);
        }
    }
    scored.into_values().rev().collect()
}

impl MasternodeList {
    /// The quorum member candidates of this list for a modifier: all
    /// scoring masternodes in descending score order. The first
    /// `quorum_size` of them are the selected members.
    pub fn scored_masternodes_for_quorum_modifier(
        &self,
        modifier: QuorumModifierHash,
    ) -> Vec<&QualifiedMasternodeListEntry> {
        masternodes_by_score_descending(self.masternodes.values(), modifier)
    }
}
