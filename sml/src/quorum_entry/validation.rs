//! BLS verification of quorum commitments.

use blsful::inner_types::G1Projective;
use blsful::{Bls12381G2Impl, PublicKey, Signature};
use hashes::Hash;

use crate::bls_sig_utils::BLSPublicKey;
use crate::masternode_list_entry::qualified_masternode_list_entry::QualifiedMasternodeListEntry;
use crate::quorum_entry::qualified_quorum_entry::QualifiedQuorumEntry;
use crate::quorum_validation_error::QuorumValidationError;

impl QualifiedQuorumEntry {
    /// Verifies the aggregate commitment signature.
    ///
    /// All signers signed the same commitment hash, so the aggregate
    /// signature verifies against the sum of the signer operator keys with
    /// a single pairing check.
    pub fn verify_aggregated_commitment_signature(
        &self,
        operator_keys: &[BLSPublicKey],
    ) -> Result<(), QuorumValidationError> {
        if operator_keys.is_empty() {
            return Err(QuorumValidationError::InsufficientSigners {
                required: 1,
                found: 0,
            });
        }
        let mut aggregate = G1Projective::IDENTITY;
        for operator_key in operator_keys {
            let key: PublicKey<Bls12381G2Impl> = operator_key.try_into()?;
            aggregate += key.0;
        }
        let signature: Signature<Bls12381G2Impl> =
            (&self.quorum_entry.all_commitment_aggregated_signature).try_into()?;
        signature
            .verify(
                &PublicKey(aggregate),
                self.commitment_hash.to_byte_array(),
            )
            .map_err(|e| {
                QuorumValidationError::AllCommitmentAggregatedSignatureNotValid(e.to_string())
            })
    }

    /// Verifies the threshold signature over the commitment hash against
    /// the quorum public key the commitment declares.
    pub fn verify_quorum_signature(&self) -> Result<(), QuorumValidationError> {
        let quorum_public_key: PublicKey<Bls12381G2Impl> =
            (&self.quorum_entry.quorum_public_key).try_into()?;
        let signature: Signature<Bls12381G2Impl> =
            (&self.quorum_entry.threshold_sig).try_into()?;
        signature
            .verify(&quorum_public_key, self.commitment_hash.to_byte_array())
            .map_err(|e| QuorumValidationError::ThresholdSignatureNotValid(e.to_string()))
    }

    /// Verifies a signature this quorum made over an arbitrary 32-byte
    /// digest (chain locks, instant locks).
    pub fn verify_message_digest(
        &self,
        digest: [u8; 32],
        signature: &crate::bls_sig_utils::BLSSignature,
    ) -> Result<(), QuorumValidationError> {
        let quorum_public_key: PublicKey<Bls12381G2Impl> =
            (&self.quorum_entry.quorum_public_key).try_into()?;
        let signature: Signature<Bls12381G2Impl> = signature.try_into()?;
        signature
            .verify(&quorum_public_key, digest)
            .map_err(|e| QuorumValidationError::ThresholdSignatureNotValid(e.to_string()))
    }

    /// Runs both BLS checks for this commitment against the quorum's
    /// member entries, ordered as selection produced them.
    ///
    /// The signer bitset is positional over that ordering; only signers
    /// that are also valid masternodes contribute operator keys.
    pub fn validate(
        &self,
        members: &[&QualifiedMasternodeListEntry],
    ) -> Result<(), QuorumValidationError> {
        let operator_keys: Vec<BLSPublicKey> = members
            .iter()
            .enumerate()
            .filter(|(index, member)| {
                member.masternode_list_entry.is_valid
                    && self.quorum_entry.signers.get(*index).copied().unwrap_or(false)
            })
            .map(|(_, member)| member.masternode_list_entry.operator_public_key)
            .collect();
        self.verify_aggregated_commitment_signature(&operator_keys)?;
        self.verify_quorum_signature()
    }
}
