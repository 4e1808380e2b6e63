use crate::error::SmlError;
use crate::masternode_list::MasternodeList;
use crate::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;
use crate::message_sml::MnListDiff;
use crate::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use crate::CoreBlockHeight;

impl MasternodeList {
    /// Applies a diff to this list, producing the candidate list at the
    /// diff's target block. The base is not mutated and nothing is
    /// committed; merkle roots of the candidate are recomputed so the
    /// caller can check them against the diff's asserted roots.
    ///
    /// Removals are processed before additions, so a masternode deleted
    /// and re-added in the same diff ends up with the added record, and
    /// likewise for quorums.
    pub fn apply_diff(
        &self,
        diff: MnListDiff,
        diff_end_height: CoreBlockHeight,
    ) -> Result<MasternodeList, SmlError> {
        if self.block_hash != diff.base_block_hash {
            return Err(SmlError::BaseBlockHashMismatch {
                expected: self.block_hash,
                found: diff.base_block_hash,
            });
        }

        let mut masternodes = self.masternodes.clone();
        for pro_tx_hash in &diff.deleted_masternodes {
            masternodes.remove(pro_tx_hash);
        }
        for mut entry in diff.new_masternodes {
            entry.update_height = diff_end_height;
            masternodes.insert(entry.pro_reg_tx_hash, QualifiedMasternodeListEntry::from(entry));
        }

        let mut quorums = self.quorums.clone();
        for deleted in &diff.deleted_quorums {
            if let Some(of_type) = quorums.get_mut(&deleted.llmq_type) {
                of_type.remove(&deleted.quorum_hash);
                if of_type.is_empty() {
                    quorums.remove(&deleted.llmq_type);
                }
            }
        }
        for entry in diff.new_quorums {
            quorums
                .entry(entry.llmq_type)
                .or_default()
                .insert(entry.quorum_hash, QualifiedQuorumEntry::from(entry));
        }

        Ok(MasternodeList::new(
            masternodes,
            quorums,
            diff.block_hash,
            diff_end_height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::net::Ipv4Addr;

    use hashes::Hash;

    use super::*;
    use crate::address::ServiceAddress;
    use crate::bls_sig_utils::BLSPublicKey;
    use crate::hash_types::{
        BlockHash, ConfirmedHash, MerkleRootMasternodeList, MerkleRootQuorums, ProTxHash,
    };
    use crate::masternode_list_entry::{MasternodeListEntry, MasternodeType};

    fn entry(tag: &[u8], port: u16) -> MasternodeListEntry {
        MasternodeListEntry {
            version: 1,
            pro_reg_tx_hash: ProTxHash::hash(tag),
            confirmed_hash: ConfirmedHash::hash(tag),
            service_address: ServiceAddress {
                ip: Ipv4Addr::new(10, 0, 0, 1),
                port,
            },
            operator_public_key: BLSPublicKey::from([1u8; 48]),
            key_id_voting: [0u8; 20],
            is_valid: true,
            mn_type: MasternodeType::Regular,
            update_height: 0,
        }
    }

    fn base_list() -> MasternodeList {
        let mut masternodes = BTreeMap::new();
        for tag in [b"mn1" as &[u8], b"mn2", b"mn3"] {
            let entry = entry(tag, 9999);
            masternodes.insert(
                entry.pro_reg_tx_hash,
                QualifiedMasternodeListEntry::from(entry),
            );
        }
        MasternodeList::new(masternodes, BTreeMap::new(), BlockHash::hash(b"base"), 100)
    }

    fn diff_on(base: &MasternodeList) -> MnListDiff {
        MnListDiff {
            version: 1,
            base_block_hash: base.block_hash,
            block_hash: BlockHash::hash(b"next"),
            merkle_root_mn_list: MerkleRootMasternodeList::hash(b"unchecked"),
            merkle_root_llmq_list: MerkleRootQuorums::hash(b"unchecked"),
            deleted_masternodes: vec![],
            new_masternodes: vec![],
            deleted_quorums: vec![],
            new_quorums: vec![],
            quorums_chainlock_signatures: vec![],
        }
    }

    #[test]
    fn base_mismatch_is_rejected() {
        let base = base_list();
        let mut diff = diff_on(&base);
        diff.base_block_hash = BlockHash::hash(b"elsewhere");
        let err = base.apply_diff(diff, 101).unwrap_err();
        assert!(matches!(err, SmlError::BaseBlockHashMismatch { .. }));
    }

    #[test]
    fn removals_run_before_additions() {
        let base = base_list();
        let replacement = {
            // Same identity, new port.
            let mut e = entry(b"mn2", 12345);
            e.version = 1;
            e
        };
        let mut diff = diff_on(&base);
        diff.deleted_masternodes = vec![replacement.pro_reg_tx_hash];
        diff.new_masternodes = vec![replacement.clone()];
        let next = base.apply_diff(diff, 101).unwrap();
        assert_eq!(next.masternode_count(), 3);
        let kept = &next.masternodes[&replacement.pro_reg_tx_hash];
        assert_eq!(kept.masternode_list_entry.service_address.port, 12345);
        assert_eq!(kept.masternode_list_entry.update_height, 101);
    }

    #[test]
    fn untouched_entries_are_preserved_and_base_is_not_mutated() {
        let base = base_list();
        let mut diff = diff_on(&base);
        diff.deleted_masternodes = vec![ProTxHash::hash(b"mn1")];
        let next = base.apply_diff(diff, 101).unwrap();
        assert_eq!(next.masternode_count(), 2);
        assert_eq!(base.masternode_count(), 3);
        assert!(next.masternodes.contains_key(&ProTxHash::hash(b"mn2")));
        assert_eq!(next.block_hash, BlockHash::hash(b"next"));
        assert_eq!(next.known_height, 101);
    }

    #[test]
    fn roots_are_recomputed_for_the_candidate() {
        let base = base_list();
        let mut diff = diff_on(&base);
        diff.deleted_masternodes = vec![ProTxHash::hash(b"mn3")];
        let next = base.apply_diff(diff, 101).unwrap();
        assert_ne!(next.masternode_merkle_root, base.masternode_merkle_root);
    }
}
