//! The `qrinfo` P2P payload (DIP-24 quorum rotation information).

use std::io::{Read, Write};

use crate::consensus::{
    encode, read_compact_size, read_fixed_bitset, write_fixed_bitset, Decodable, Encodable,
};
use crate::hash_types::BlockHash;
use crate::message_sml::MnListDiff;

/// How the skip list of a quorum snapshot is to be interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u32)]
pub enum MNSkipListMode {
    /// Take the first entries of the scored list.
    NoSkipping = 0,
    /// The first skip entry is an absolute index, the rest are relative to
    /// it; listed indices are skipped.
    SkipFirst = 1,
    /// Only the listed indices participate.
    SkipExcept = 2,
    /// No entries of this snapshot participate.
    SkipAll = 3,
}

impl Encodable for MNSkipListMode {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        (*self as u32).consensus_encode(writer)
    }
}

impl Decodable for MNSkipListMode {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        match u32::consensus_decode(reader)? {
            0 => Ok(MNSkipListMode::NoSkipping),
            1 => Ok(MNSkipListMode::SkipFirst),
            2 => Ok(MNSkipListMode::SkipExcept),
            3 => Ok(MNSkipListMode::SkipAll),
            _ => Err(encode::Error::ParseFailed("invalid skip list mode")),
        }
    }
}

/// The DKG participation snapshot taken at a rotation cycle boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumSnapshot {
    pub skip_list_mode: MNSkipListMode,
    /// One bit per masternode of the reference list, in score order.
    pub active_quorum_members: Vec<bool>,
    pub skip_list: Vec<i32>,
}

impl Encodable for QuorumSnapshot {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = self.skip_list_mode.consensus_encode(writer)?;
        len += write_fixed_bitset(writer, &self.active_quorum_members)?;
        len += self.skip_list.consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for QuorumSnapshot {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let skip_list_mode = MNSkipListMode::consensus_decode(reader)?;
        let member_count = read_compact_size(reader)? as usize;
        let active_quorum_members = read_fixed_bitset(reader, member_count)?;
        let skip_list = Vec::<i32>::consensus_decode(reader)?;
        Ok(QuorumSnapshot {
            skip_list_mode,
            active_quorum_members,
            skip_list,
        })
    }
}

/// Quorum rotation information for the cycle ending at a tip.
///
/// Carries the snapshots and diffs needed to rebuild the member sets of
/// the currently active rotated quorums: snapshots at h-c, h-2c and h-3c
/// (optionally h-4c), diffs reaching each of those heights plus the tip,
/// the cycle-start block of the last commitment per quorum index, and any
/// further snapshot/diff pairs the requester asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QRInfo {
    pub quorum_snapshot_at_h_minus_c: QuorumSnapshot,
    pub quorum_snapshot_at_h_minus_2c: QuorumSnapshot,
    pub quorum_snapshot_at_h_minus_3c: QuorumSnapshot,
    pub mn_list_diff_tip: MnListDiff,
    pub mn_list_diff_at_h: MnListDiff,
    pub mn_list_diff_at_h_minus_c: MnListDiff,
    pub mn_list_diff_at_h_minus_2c: MnListDiff,
    pub mn_list_diff_at_h_minus_3c: MnListDiff,
    pub extra_share: Option<(QuorumSnapshot, MnListDiff)>,
    pub last_commitment_per_index: Vec<BlockHash>,
    pub quorum_snapshot_list: Vec<QuorumSnapshot>,
    pub mn_list_diff_list: Vec<MnListDiff>,
}

impl Encodable for QRInfo {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = self.quorum_snapshot_at_h_minus_c.consensus_encode(writer)?;
        len += self.quorum_snapshot_at_h_minus_2c.consensus_encode(writer)?;
        len += self.quorum_snapshot_at_h_minus_3c.consensus_encode(writer)?;
        len += self.mn_list_diff_tip.consensus_encode(writer)?;
        len += self.mn_list_diff_at_h.consensus_encode(writer)?;
        len += self.mn_list_diff_at_h_minus_c.consensus_encode(writer)?;
        len += self.mn_list_diff_at_h_minus_2c.consensus_encode(writer)?;
        len += self.mn_list_diff_at_h_minus_3c.consensus_encode(writer)?;
        match &self.extra_share {
            Some((snapshot, diff)) => {
                len += true.consensus_encode(writer)?;
                len += snapshot.consensus_encode(writer)?;
                len += diff.consensus_encode(writer)?;
            }
            None => {
                len += false.consensus_encode(writer)?;
            }
        }
        len += self.last_commitment_per_index.consensus_encode(writer)?;
        len += self.quorum_snapshot_list.consensus_encode(writer)?;
        len += self.mn_list_diff_list.consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for QRInfo {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let quorum_snapshot_at_h_minus_c = QuorumSnapshot::consensus_decode(reader)?;
        let quorum_snapshot_at_h_minus_2c = QuorumSnapshot::consensus_decode(reader)?;
        let quorum_snapshot_at_h_minus_3c = QuorumSnapshot::consensus_decode(reader)?;
        let mn_list_diff_tip = MnListDiff::consensus_decode(reader)?;
        let mn_list_diff_at_h = MnListDiff::consensus_decode(reader)?;
        let mn_list_diff_at_h_minus_c = MnListDiff::consensus_decode(reader)?;
        let mn_list_diff_at_h_minus_2c = MnListDiff::consensus_decode(reader)?;
        let mn_list_diff_at_h_minus_3c = MnListDiff::consensus_decode(reader)?;
        let extra_share = if bool::consensus_decode(reader)? {
            let snapshot = QuorumSnapshot::consensus_decode(reader)?;
            let diff = MnListDiff::consensus_decode(reader)?;
            Some((snapshot, diff))
        } else {
            None
        };
        let last_commitment_per_index = Vec::<BlockHash>::consensus_decode(reader)?;
        let quorum_snapshot_list = Vec::<QuorumSnapshot>::consensus_decode(reader)?;
        let mn_list_diff_list = Vec::<MnListDiff>::consensus_decode(reader)?;
        Ok(QRInfo {
            quorum_snapshot_at_h_minus_c,
            quorum_snapshot_at_h_minus_2c,
            quorum_snapshot_at_h_minus_3c,
            mn_list_diff_tip,
            mn_list_diff_at_h,
            mn_list_diff_at_h_minus_c,
            mn_list_diff_at_h_minus_2c,
            mn_list_diff_at_h_minus_3c,
            extra_share,
            last_commitment_per_index,
            quorum_snapshot_list,
            mn_list_diff_list,
        })
    }
}
