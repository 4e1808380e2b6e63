use std::collections::BTreeMap;

use crate::bls_sig_utils::BLSSignature;
use crate::hash_types::BlockHash;

/// Outcome of offering a chain-lock signature to the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CLSignatureStatus {
    /// No signature was stored for the block; the offered one is now kept.
    Inserted,
    /// The identical signature was already stored.
    Confirmed,
    /// A different signature is already stored. The stored one stays.
    Conflicted { existing: BLSSignature },
}

/// Append-only map of chain-lock signatures by block hash.
///
/// A stored signature is never replaced or deleted; a conflicting offer is
/// reported and dropped.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainLockSignatureStore {
    signatures: BTreeMap<BlockHash, BLSSignature>,
}

impl ChainLockSignatureStore {
    pub fn save(&mut self, block_hash: BlockHash, signature: BLSSignature) -> CLSignatureStatus {
        match self.signatures.get(&block_hash) {
            None => {
                self.signatures.insert(block_hash, signature);
                CLSignatureStatus::Inserted
            }
            Some(existing) if *existing == signature => CLSignatureStatus::Confirmed,
            Some(existing) => CLSignatureStatus::Conflicted {
                existing: *existing,
            },
        }
    }

    pub fn get(&self, block_hash: &BlockHash) -> Option<&BLSSignature> {
        self.signatures.get(block_hash)
    }

    pub fn len(&self) -> usize {
        self.signatures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signatures.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use hashes::Hash;

    use super::*;

    #[test]
    fn insert_confirm_conflict() {
        let mut store = ChainLockSignatureStore::default();
        let block_hash = BlockHash::hash(b"block");
        let first = BLSSignature::from([1u8; 96]);
        let second = BLSSignature::from([2u8; 96]);

        assert_eq!(store.save(block_hash, first), CLSignatureStatus::Inserted);
        assert_eq!(store.save(block_hash, first), CLSignatureStatus::Confirmed);
        assert_eq!(
            store.save(block_hash, second),
            CLSignatureStatus::Conflicted { existing: first }
        );
        // The original signature survives the conflicting offer.
        assert_eq!(store.get(&block_hash), Some(&first));
        assert_eq!(store.len(), 1);
    }
}
