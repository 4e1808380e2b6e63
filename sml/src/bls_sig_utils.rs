//! Fixed-width BLS12-381 key and signature wrappers.
//!
//! The wire format carries compressed points: 48 bytes for a G1 public key,
//! 96 bytes for a G2 signature. Deserialization of the raw bytes is
//! structural only; point validity is checked at verification time when the
//! wrapper is converted into a `blsful` type.

use std::fmt;
use std::io::{Read, Write};

use blsful::inner_types::{G1Projective, G2Projective};
use blsful::{Bls12381G2Impl, PublicKey, Signature};

use crate::consensus::{encode, Decodable, Encodable};
use crate::quorum_validation_error::QuorumValidationError;

/// A compressed BLS public key on G1.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BLSPublicKey([u8; 48]);

/// A compressed BLS signature on G2.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BLSSignature([u8; 96]);

impl BLSPublicKey {
    pub fn as_bytes(&self) -> &[u8; 48] {
        &self.0
    }
}

impl BLSSignature {
    pub fn as_bytes(&self) -> &[u8; 96] {
        &self.0
    }
}

impl From<[u8; 48]> for BLSPublicKey {
    fn from(bytes: [u8; 48]) -> Self {
        BLSPublicKey(bytes)
    }
}

impl From<[u8; 96]> for BLSSignature {
    fn from(bytes: [u8; 96]) -> Self {
        BLSSignature(bytes)
    }
}

impl From<&PublicKey<Bls12381G2Impl>> for BLSPublicKey {
    fn from(key: &PublicKey<Bls12381G2Impl>) -> Self {
        BLSPublicKey(key.0.to_compressed())
    }
}

impl fmt::Display for BLSPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Display for BLSSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for BLSPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BLSPublicKey({})", self)
    }
}

impl fmt::Debug for BLSSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BLSSignature({})", self)
    }
}

impl Encodable for BLSPublicKey {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        self.0.consensus_encode(writer)
    }
}

impl Decodable for BLSPublicKey {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        Ok(BLSPublicKey(<[u8; 48]>::consensus_decode(reader)?))
    }
}

impl Encodable for BLSSignature {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, std::io::Error> {
        self.0.consensus_encode(writer)
    }
}

impl Decodable for BLSSignature {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, encode::Error> {
        Ok(BLSSignature(<[u8; 96]>::consensus_decode(reader)?))
    }
}

impl TryFrom<&BLSPublicKey> for PublicKey<Bls12381G2Impl> {
    type Error = QuorumValidationError;

    fn try_from(value: &BLSPublicKey) -> Result<Self, Self::Error> {
        let point = Option::<G1Projective>::from(G1Projective::from_compressed(&value.0))
            .ok_or_else(|| QuorumValidationError::InvalidBLSPublicKey(value.to_string()))?;
        Ok(PublicKey(point))
    }
}

impl TryFrom<BLSPublicKey> for PublicKey<Bls12381G2Impl> {
    type Error = QuorumValidationError;

    fn try_from(value: BLSPublicKey) -> Result<Self, Self::Error> {
        (&value).try_into()
    }
}

impl TryFrom<&BLSSignature> for Signature<Bls12381G2Impl> {
    type Error = QuorumValidationError;

    fn try_from(value: &BLSSignature) -> Result<Self, Self::Error> {
        let point = Option::<G2Projective>::from(G2Projective::from_compressed(&value.0))
            .ok_or_else(|| QuorumValidationError::InvalidBLSSignature(value.to_string()))?;
        Ok(Signature::Basic(point))
    }
}

impl TryFrom<BLSSignature> for Signature<Bls12381G2Impl> {
    type Error = QuorumValidationError;

    fn try_from(value: BLSSignature) -> Result<Self, Self::Error> {
        (&value).try_into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use blsful::SecretKey;

    fn secret_key(tag: u8) -> SecretKey<Bls12381G2Impl> {
        let mut bytes = [0u8; 32];
        bytes[31] = tag;
        Option::from(SecretKey::<Bls12381G2Impl>::from_be_bytes(&bytes)).unwrap()
    }

    #[test]
    fn public_key_round_trips_through_wrapper() {
        let pk = PublicKey::from(&secret_key(7));
        let wrapped = BLSPublicKey::from(&pk);
        let recovered: PublicKey<Bls12381G2Impl> = (&wrapped).try_into().unwrap();
        assert_eq!(recovered, pk);
    }

    #[test]
    fn garbage_public_key_fails_conversion() {
        let wrapped = BLSPublicKey::from([0xFFu8; 48]);
        let result: Result<PublicKey<Bls12381G2Impl>, _> = (&wrapped).try_into();
        assert!(matches!(
            result,
            Err(QuorumValidationError::InvalidBLSPublicKey(_))
        ));
    }

    #[test]
    fn signature_codec_is_raw_bytes() {
        let sig = BLSSignature::from([3u8; 96]);
        let encoded = crate::consensus::serialize(&sig);
        assert_eq!(encoded.len(), 96);
        let decoded: BLSSignature = crate::consensus::deserialize(&encoded).unwrap();
        assert_eq!(decoded, sig);
    }
}
