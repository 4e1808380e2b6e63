//! Encoding and decoding of the wire payloads the engine consumes.

use std::io::{self, Cursor, Read, Write};
use std::mem;

use thiserror::Error;

/// Maximum size, in bytes, of a vector we are allowed to decode.
pub const MAX_VEC_SIZE: usize = 4_000_000;

/// Maximum number of entries in a fixed bitset.
const MAX_BITSET_SIZE: usize = MAX_VEC_SIZE * 8;

/// Decoding error.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    /// Tried to allocate an oversized vector.
    #[error("allocation of oversized vector: requested {requested}, maximum {max}")]
    OversizedVectorAllocation {
        /// The capacity requested.
        requested: usize,
        /// The maximum capacity.
        max: usize,
    },
    /// VarInt was encoded in a non-minimal way.
    #[error("non-minimal varint")]
    NonMinimalVarInt,
    /// Parsing error.
    #[error("parse failed: {0}")]
    ParseFailed(&'static str),
}

/// Encodes an object into a vector.
pub fn serialize<T: Encodable + ?Sized>(data: &T) -> Vec<u8> {
    let mut encoder = Vec::new();
    let len = data
        .consensus_encode(&mut encoder)
        .expect("in-memory writers do not error");
    debug_assert_eq!(len, encoder.len());
    encoder
}

/// Deserializes an object from a byte slice, erroring if the entire slice is
/// not consumed.
pub fn deserialize<T: Decodable>(data: &[u8]) -> Result<T, Error> {
    let mut decoder = Cursor::new(data);
    let rv = T::consensus_decode(&mut decoder)?;
    if decoder.position() == data.len() as u64 {
        Ok(rv)
    } else {
        Err(Error::ParseFailed("data not consumed entirely when explicitly deserializing"))
    }
}

/// Data which can be encoded in a consensus-consistent way.
pub trait Encodable {
    /// Encodes an object with a well-defined format, returning the number of
    /// bytes written.
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error>;
}

/// Data which can be decoded in a consensus-consistent way.
pub trait Decodable: Sized {
    /// Decodes an object with a well-defined format.
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error>;
}

macro_rules! impl_int_encodable {
    ($ty:ty) => {
        impl Encodable for $ty {
            #[inline]
            fn consensus_encode<W: Write + ?Sized>(
                &self,
                writer: &mut W,
            ) -> Result<usize, io::Error> {
                writer.write_all(&self.to_le_bytes())?;
                Ok(mem::size_of::<$ty>())
            }
        }

        impl Decodable for $ty {
            #[inline]
            fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
                let mut buf = [0u8; mem::size_of::<$ty>()];
                reader.read_exact(&mut buf)?;
                Ok(<$ty>::from_le_bytes(buf))
            }
        }
    };
}

impl_int_encodable!(u8);
impl_int_encodable!(u16);
impl_int_encodable!(u32);
impl_int_encodable!(u64);
impl_int_encodable!(i16);
impl_int_encodable!(i32);
impl_int_encodable!(i64);

impl Encodable for bool {
    #[inline]
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        u8::from(*self).consensus_encode(writer)
    }
}

impl Decodable for bool {
    #[inline]
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        Ok(u8::consensus_decode(reader)? != 0)
    }
}

/// A variable-length unsigned integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct VarInt(pub u64);

impl VarInt {
    /// Length of the encoded form in bytes.
    pub fn len(&self) -> usize {
        match self.0 {
            0..=0xFC => 1,
            0xFD..=0xFFFF => 3,
            0x10000..=0xFFFFFFFF => 5,
            _ => 9,
        }
    }
}

impl Encodable for VarInt {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        match self.0 {
            0..=0xFC => {
                (self.0 as u8).consensus_encode(writer)?;
                Ok(1)
            }
            0xFD..=0xFFFF => {
                writer.write_all(&[0xFD])?;
                (self.0 as u16).consensus_encode(writer)?;
                Ok(3)
            }
            0x10000..=0xFFFFFFFF => {
                writer.write_all(&[0xFE])?;
                (self.0 as u32).consensus_encode(writer)?;
                Ok(5)
            }
            _ => {
                writer.write_all(&[0xFF])?;
                self.0.consensus_encode(writer)?;
                Ok(9)
            }
        }
    }
}

impl Decodable for VarInt {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        let n = u8::consensus_decode(reader)?;
        match n {
            0xFF => {
                let x = u64::consensus_decode(reader)?;
                if x < 0x100000000 {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(x))
                }
            }
            0xFE => {
                let x = u32::consensus_decode(reader)?;
                if x < 0x10000 {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(u64::from(x)))
                }
            }
            0xFD => {
                let x = u16::consensus_decode(reader)?;
                if x < 0xFD {
                    Err(Error::NonMinimalVarInt)
                } else {
                    Ok(VarInt(u64::from(x)))
                }
            }
            n => Ok(VarInt(u64::from(n))),
        }
    }
}

macro_rules! impl_array_encodable {
    ($size:expr) => {
        impl Encodable for [u8; $size] {
            #[inline]
            fn consensus_encode<W: Write + ?Sized>(
                &self,
                writer: &mut W,
            ) -> Result<usize, io::Error> {
                writer.write_all(self)?;
                Ok($size)
            }
        }

        impl Decodable for [u8; $size] {
            #[inline]
            fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
                let mut buf = [0u8; $size];
                reader.read_exact(&mut buf)?;
                Ok(buf)
            }
        }
    };
}

impl_array_encodable!(4);
impl_array_encodable!(16);
impl_array_encodable!(20);
impl_array_encodable!(32);
impl_array_encodable!(48);
impl_array_encodable!(96);

impl<T: Encodable> Encodable for Vec<T> {
    fn consensus_encode<W: Write + ?Sized>(&self, writer: &mut W) -> Result<usize, io::Error> {
        let mut len = VarInt(self.len() as u64).consensus_encode(writer)?;
        for item in self {
            len += item.consensus_encode(writer)?;
        }
        Ok(len)
    }
}

impl<T: Decodable> Decodable for Vec<T> {
    fn consensus_decode<R: Read + ?Sized>(reader: &mut R) -> Result<Self, Error> {
        let count = VarInt::consensus_decode(reader)?.0 as usize;
        // Cap the pre-allocation so a hostile count cannot exhaust memory
        // before the reader runs dry.
        let byte_size = count
            .checked_mul(mem::size_of::<T>().max(1))
            .ok_or(Error::ParseFailed("invalid vector length"))?;
        if byte_size > MAX_VEC_SIZE {
            return Err(Error::OversizedVectorAllocation {
                requested: byte_size,
                max: MAX_VEC_SIZE,
            });
        }
        let mut rv = Vec::with_capacity(count);
        for _ in 0..count {
            rv.push(T::consensus_decode(reader)?);
        }
        Ok(rv)
    }
}

/// Reads a compact-size prefixed unsigned integer, rejecting non-minimal
/// encodings.
pub fn read_compact_size<R: Read + ?Sized>(reader: &mut R) -> Result<u64, Error> {
    Ok(VarInt::consensus_decode(reader)?.0)
}

/// Writes a compact-size prefixed unsigned integer, returning the number of
/// bytes written.
pub fn write_compact_size<W: Write + ?Sized>(writer: &mut W, value: u64) -> Result<usize, io::Error> {
    VarInt(value).consensus_encode(writer)
}

/// Reads a fixed bitset of `size` bits, packed least-significant-bit first
/// into `(size + 7) / 8` bytes.
pub fn read_fixed_bitset<R: Read + ?Sized>(reader: &mut R, size: usize) -> Result<Vec<bool>, Error> {
    if size > MAX_BITSET_SIZE {
        return Err(Error::OversizedVectorAllocation {
            requested: size,
            max: MAX_BITSET_SIZE,
        });
    }
    let mut bytes = vec![0u8; (size + 7) / 8];
    reader.read_exact(&mut bytes)?;
    let mut bits = Vec::with_capacity(size);
    for i in 0..size {
        bits.push(bytes[i / 8] & (1 << (i % 8)) != 0);
    }
    Ok(bits)
}

/// Writes a bitset as its compact-size bit count followed by the packed
/// bytes, returning the number of bytes written.
pub fn write_fixed_bitset<W: Write + ?Sized>(writer: &mut W, bits: &[bool]) -> Result<usize, io::Error> {
    let mut written = write_compact_size(writer, bits.len() as u64)?;
    let mut bytes = vec![0u8; (bits.len() + 7) / 8];
    for (i, bit) in bits.iter().enumerate() {
        if *bit {
            bytes[i / 8] |= 1 << (i % 8);
        }
    }
    writer.write_all(&bytes)?;
    written += bytes.len();
    Ok(written)
}
