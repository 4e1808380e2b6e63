//! LLMQ final commitments (DIP-6) as carried in `mnlistdiff` payloads.

pub mod qualified_quorum_entry;
pub mod quorum_modifier_type;
pub mod validation;

use std::io::{Read, Write};

use hashes::Hash;

use crate::bls_sig_utils::{BLSPublicKey, BLSSignature};
use crate::consensus::{
    encode, read_compact_size, read_fixed_bitset, serialize, write_fixed_bitset, Decodable,
    Encodable,
};
use crate::hash_types::{QuorumCommitmentHash, QuorumEntryHash, QuorumHash, QuorumVVecHash};
use crate::llmq_type::LLMQType;
use crate::quorum_validation_error::QuorumValidationError;

/// Commitment versions that carry a quorum index (rotating quorums).
const COMMITMENT_VERSION_INDEXED: u16 = 2;
const COMMITMENT_VERSION_INDEXED_BASIC_BLS: u16 = 4;

/// A quorum final commitment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumEntry {
    pub version: u16,
    pub llmq_type: LLMQType,
    pub quorum_hash: QuorumHash,
    /// Present for rotating quorum commitments (versions 2 and 4).
    pub quorum_index: Option<i16>,
    pub signers: Vec<bool>,
    pub valid_members: Vec<bool>,
    pub quorum_public_key: BLSPublicKey,
    pub quorum_vvec_hash: QuorumVVecHash,
    /// Threshold signature over the commitment hash, made with the quorum
    /// secret key.
    pub threshold_sig: BLSSignature,
    /// Aggregate of the individual member signatures over the commitment
    /// hash.
    pub all_commitment_aggregated_signature: BLSSignature,
}

impl QuorumEntry {
    fn carries_index(version: u16) -> bool {
        version == COMMITMENT_VERSION_INDEXED || version == COMMITMENT_VERSION_INDEXED_BASIC_BLS
    }

    /// Double SHA-256 of the serialized commitment, the quorum's leaf in
    /// the quorum merkle tree.
    pub fn calculate_entry_hash(&self) -> QuorumEntryHash {
        QuorumEntryHash::hash(&serialize(self))
    }

    /// The message quorum members signed: llmq type, quorum hash, valid
    /// member bitset, quorum public key and verification vector hash.
    pub fn calculate_commitment_hash(&self) -> QuorumCommitmentHash {
        let mut buf = Vec::new();
        let mut write = || -> Result<(), std::io::Error> {
            self.llmq_type.consensus_encode(&mut buf)?;
            self.quorum_hash.consensus_encode(&mut buf)?;
            write_fixed_bitset(&mut buf, &self.valid_members)?;
            self.quorum_public_key.consensus_encode(&mut buf)?;
            self.quorum_vvec_hash.consensus_encode(&mut buf)?;
            Ok(())
        };
        write().expect("in-memory writers do not error");
        QuorumCommitmentHash::hash(&buf)
    }

    /// Number of commitment signers.
    pub fn signers_count(&self) -> usize {
        self.signers.iter().filter(|bit| **bit).count()
    }

    /// Number of members the commitment declares valid.
    pub fn valid_members_count(&self) -> usize {
        self.valid_members.iter().filter(|bit| **bit).count()
    }

    /// Checks the commitment's bitsets against the quorum type's
    /// parameters. Runs before any cryptography.
    pub fn validate_structure(&self) -> Result<(), QuorumValidationError> {
        let params = self.llmq_type.params();
        if self.signers.len() != self.valid_members.len() {
            return Err(QuorumValidationError::MismatchedBitsetLengths {
                signers_len: self.signers.len(),
                valid_members_len: self.valid_members.len(),
            });
        }
        if self.signers.len() != params.size {
            return Err(QuorumValidationError::InvalidBitsetLength {
                expected: params.size,
                found: self.signers.len(),
            });
        }
        let signers = self.signers_count();
        if signers < params.threshold {
            return Err(QuorumValidationError::InsufficientSigners {
                required: params.threshold,
                found: signers,
            });
        }
        let valid = self.valid_members_count();
        if valid < params.min_size {
            return Err(QuorumValidationError::InsufficientValidMembers {
                required: params.min_size,
                found: valid,
            });
        }
        Ok(())
    }
}

impl Encodable for QuorumEntry {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        let mut len = self.version.consensus_encode(writer)?;
        len += self.llmq_type.consensus_encode(writer)?;
        len += self.quorum_hash.consensus_encode(writer)?;
        if Self::carries_index(self.version) {
            len += self.quorum_index.unwrap_or(0).consensus_encode(writer)?;
        }
        len += write_fixed_bitset(writer, &self.signers)?;
        len += write_fixed_bitset(writer, &self.valid_members)?;
        len += self.quorum_public_key.consensus_encode(writer)?;
        len += self.quorum_vvec_hash.consensus_encode(writer)?;
        len += self.threshold_sig.consensus_encode(writer)?;
        len += self.all_commitment_aggregated_signature.consensus_encode(writer)?;
        Ok(len)
    }
}

impl Decodable for QuorumEntry {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        let version = u16::consensus_decode(reader)?;
        let llmq_type = LLMQType::consensus_decode(reader)?;
        let quorum_hash = QuorumHash::consensus_decode(reader)?;
        let quorum_index = if Self::carries_index(version) {
            Some(i16::consensus_decode(reader)?)
        } else {
            None
        };
        let signers_count = read_compact_size(reader)? as usize;
        let signers = read_fixed_bitset(reader, signers_count)?;
        let valid_members_count = read_compact_size(reader)? as usize;
        let valid_members = read_fixed_bitset(reader, valid_members_count)?;
        let quorum_public_key = BLSPublicKey::consensus_decode(reader)?;
        let quorum_vvec_hash = QuorumVVecHash::consensus_decode(reader)?;
        let threshold_sig = BLSSignature::consensus_decode(reader)?;
        let all_commitment_aggregated_signature = BLSSignature::consensus_decode(reader)?;
        Ok(QuorumEntry {
            version,
            llmq_type,
            quorum_hash,
            quorum_index,
            signers,
            valid_members,
            quorum_public_key,
            quorum_vvec_hash,
            threshold_sig,
            all_commitment_aggregated_signature,
        })
    }
}
