//! A single masternode as carried in `mnlistdiff` payloads.

pub mod qualified_masternode_list_entry;

use std::io::{Read, Write};

use hashes::Hash;

use crate::address::ServiceAddress;
use crate::bls_sig_utils::BLSPublicKey;
use crate::consensus::{encode, serialize, Decodable, Encodable};
use crate::hash_types::{ConfirmedHash, MasternodeEntryHash, ProTxHash};
use crate::CoreBlockHeight;

/// Kind of masternode, with the extra fields evnodes carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MasternodeType {
    Regular,
    /// High-performance (evo) masternode serving platform.
    HighPerformance {
        platform_http_port: u16,
        platform_node_id: [u8; 20],
    },
}

/// A simplified masternode list entry.
///
/// `update_height` is not part of the wire encoding; the engine stamps it
/// with the height of the diff that introduced the entry.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MasternodeListEntry {
    pub version: u16,
    pub pro_reg_tx_hash: ProTxHash,
    pub confirmed_hash: ConfirmedHash,
    pub service_address: ServiceAddress,
    pub operator_public_key: BLSPublicKey,
    pub key_id_voting: [u8; 20],
    pub is_valid: bool,
    pub mn_type: MasternodeType,
    pub update_height: CoreBlockHeight,
}

/// Entry versions that carry the masternode type field.
const ENTRY_VERSION_TYPED: u16 = 2;

impl MasternodeListEntry {
    /// Double SHA-256 of the serialized entry, the leaf this masternode
    /// contributes to the masternode merkle tree.
    pub fn calculate_entry_hash(&self) -> MasternodeEntryHash {
        MasternodeEntryHash::hash(&serialize(self))
    }
}

impl Encodable for MasternodeListEntry {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = self.version.consensus_encode(writer)?;
        len += self.pro_reg_tx_hash.consensus_encode(writer)?;
        len += self.confirmed_hash.consensus_encode(writer)?;
        len += self.service_address.consensus_encode(writer)?;
        len += self.operator_public_key.consensus_encode(writer)?;
        len += self.key_id_voting.consensus_encode(writer)?;
        len += self.is_valid.consensus_encode(writer)?;
        if self.version >= ENTRY_VERSION_TYPED {
            match self.mn_type {
                MasternodeType::Regular => {
                    len += 0u16.consensus_encode(writer)?;
                }
                MasternodeType::HighPerformance {
                    platform_http_port,
                    platform_node_id,
                } => {
                    len += 1u16.consensus_encode(writer)?;
                    len += platform_http_port.consensus_encode(writer)?;
                    len += platform_node_id.consensus_encode(writer)?;
                }
            }
        }
        Ok(len)
    }
}

impl Decodable for MasternodeListEntry {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let version = u16::consensus_decode(reader)?;
        let pro_reg_tx_hash = ProTxHash::consensus_decode(reader)?;
        let confirmed_hash = ConfirmedHash::consensus_decode(reader)?;
        let service_address = ServiceAddress::consensus_decode(reader)?;
        let operator_public_key = BLSPublicKey::consensus_decode(reader)?;
        let key_id_voting = <[u8; 20]>::consensus_decode(reader)?;
        let is_valid = bool::consensus_decode(reader)?;
        let mn_type = if version >= ENTRY_VERSION_TYPED {
            match u16::consensus_decode(reader)? {
                0 => MasternodeType::Regular,
                1 => MasternodeType::HighPerformance {
                    platform_http_port: u16::consensus_decode(reader)?,
                    platform_node_id: <[u8; 20]>::consensus_decode(reader)?,
                },
                _ => return Err(encode::Error::ParseFailed("unknown masternode type")),
            }
        } else {
            MasternodeType::Regular
        };
        Ok(MasternodeListEntry {
            version,
            pro_reg_tx_hash,
            confirmed_hash,
            service_address,
            operator_public_key,
            key_id_voting,
            is_valid,
            mn_type,
            update_height: 0,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::net::Ipv4Addr;

    use super::*;
    use crate::consensus::deserialize;

    fn entry(version: u16, mn_type: MasternodeType) -> MasternodeListEntry {
        MasternodeListEntry {
            version,
            pro_reg_tx_hash: ProTxHash::hash(b"protx"),
            confirmed_hash: ConfirmedHash::hash(b"confirmed"),
            service_address: ServiceAddress {
                ip: Ipv4Addr::new(10, 0, 0, 2),
                port: 19999,
            },
            operator_public_key: BLSPublicKey::from([5u8; 48]),
            key_id_voting: [7u8; 20],
            is_valid: true,
            mn_type,
            update_height: 0,
        }
    }

    #[test]
    fn round_trip_legacy_entry() {
        let entry = entry(1, MasternodeType::Regular);
        let decoded: MasternodeListEntry = deserialize(&serialize(&entry)).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn round_trip_evo_entry() {
        let entry = entry(
            2,
            MasternodeType::HighPerformance {
                platform_http_port: 443,
                platform_node_id: [9u8; 20],
            },
        );
        let decoded: MasternodeListEntry = deserialize(&serialize(&entry)).unwrap();
        assert_eq!(decoded, entry);
    }

    #[test]
    fn entry_hash_tracks_content() {
        let a = entry(1, MasternodeType::Regular);
        let mut b = a.clone();
        b.is_valid = false;
        assert_ne!(a.calculate_entry_hash(), b.calculate_entry_hash());
    }
}
