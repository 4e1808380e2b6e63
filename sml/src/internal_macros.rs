/// Implements `Encodable`/`Decodable` for a struct by encoding its fields in
/// declaration order.
macro_rules! impl_consensus_encoding {
    ($thing:ident, $($field:ident),+ $(,)?) => {
        impl $crate::consensus::Encodable for $thing {
            fn consensus_encode<W: std::io::Write + ?Sized>(
                &self,
                writer: &mut W,
            ) -> Result<usize, std::io::Error> {
                let mut len = 0;
                $(
                    len += self.$field.consensus_encode(writer)?;
                )+
                Ok(len)
            }
        }

        impl $crate::consensus::Decodable for $thing {
            fn consensus_decode<R: std::io::Read + ?Sized>(
                reader: &mut R,
            ) -> Result<Self, $crate::consensus::encode::Error> {
                Ok($thing {
                    $(
                        $field: $crate::consensus::Decodable::consensus_decode(reader)?,
                    )+
                })
            }
        }
    };
}

/// Implements `Encodable`/`Decodable` for a `hash_newtype!` type as its raw
/// 32 bytes.
macro_rules! impl_hashencode {
    ($hashtype:ident) => {
        impl $crate::consensus::Encodable for $hashtype {
            fn consensus_encode<W: std::io::Write + ?Sized>(
                &self,
                writer: &mut W,
            ) -> Result<usize, std::io::Error> {
                use hashes::Hash;
                self.to_byte_array().consensus_encode(writer)
            }
        }

        impl $crate::consensus::Decodable for $hashtype {
            fn consensus_decode<R: std::io::Read + ?Sized>(
                reader: &mut R,
            ) -> Result<Self, $crate::consensus::encode::Error> {
                use hashes::Hash;
                Ok(Self::from_byte_array(
                    <[u8; 32] as $crate::consensus::Decodable>::consensus_decode(reader)?,
                ))
            }
        }
    };
}
